//! Upload and processing status vocabularies.
//!
//! Records carry statuses as free strings because the processing service
//! writes them directly. These enums are the values the client offers in its
//! filter menus and the server writes itself. `NA` is never stored: it only
//! appears as a filter criterion meaning "no status set".

use std::fmt;
use std::str::FromStr;

/// Filter sentinel for "null or empty status".
pub const NA: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    InProgress,
    Completed,
    Error,
    Na,
}

impl UploadStatus {
    pub const ALL: [UploadStatus; 4] = [
        UploadStatus::InProgress,
        UploadStatus::Completed,
        UploadStatus::Error,
        UploadStatus::Na,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::InProgress => "IN_PROGRESS",
            UploadStatus::Completed => "COMPLETED",
            UploadStatus::Error => "ERROR",
            UploadStatus::Na => NA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStatus {
    InProgress,
    Completed,
    Error,
    Na,
}

impl ProcessingStatus {
    pub const ALL: [ProcessingStatus; 4] = [
        ProcessingStatus::InProgress,
        ProcessingStatus::Completed,
        ProcessingStatus::Error,
        ProcessingStatus::Na,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::InProgress => "IN_PROGRESS",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Error => "ERROR",
            ProcessingStatus::Na => NA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for UploadStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl FromStr for ProcessingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trims and uppercases a stored or requested status for comparison.
pub fn normalize(status: &str) -> String {
    status.trim().to_uppercase()
}

/// Whether a stored status satisfies a filter criterion.
///
/// An empty criterion accepts everything. Otherwise the stored value matches
/// when it normalizes to the criterion, or when the criterion is [`NA`] and
/// nothing is stored.
pub fn status_matches(stored: Option<&str>, criterion: &str) -> bool {
    if criterion.is_empty() {
        return true;
    }
    let criterion = normalize(criterion);
    match stored {
        Some(stored) if !stored.is_empty() => normalize(stored) == criterion,
        _ => criterion == NA,
    }
}

/// Whether a stored upload status equals `status`.
pub fn is_status(stored: Option<&str>, status: &str) -> bool {
    stored.map(normalize).as_deref() == Some(status)
}
