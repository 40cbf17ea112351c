use super::status::status_matches;
use super::types::RosbagRecord;

/// Filter selections from the rosbag page. Empty strings mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub upload_status: String,
    pub processing_status: String,
    pub filter_text: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.upload_status.is_empty()
            && self.processing_status.is_empty()
            && self.filter_text.is_empty()
    }

    /// All three predicates must hold; each one is skipped when its criterion
    /// is empty.
    pub fn matches(&self, record: &RosbagRecord) -> bool {
        status_matches(record.upload_status.as_deref(), &self.upload_status)
            && status_matches(record.process_status.as_deref(), &self.processing_status)
            && self.matches_text(record)
    }

    // Description is compared case-insensitively, the filename against the
    // lowercased query as-is.
    fn matches_text(&self, record: &RosbagRecord) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let needle = self.filter_text.to_lowercase();
        let in_description = record
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&needle));
        in_description || record.original_filename.contains(&needle)
    }

    pub fn apply(&self, records: Vec<RosbagRecord>) -> Vec<RosbagRecord> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|record| self.matches(record)).collect()
    }
}
