//! Persistence of rosbag records.
//!
//! [`RosbagRepository`] is the contract the API handlers depend on.
//! [`InMemoryRosbagRepository`] keeps records in process memory keyed by
//! `original_filename`; it is not durable across restarts.

use crate::rosbag::status::{is_status, normalize};
use crate::rosbag::{ProcessingStatus, RosbagRecord, UploadFileInfo, UploadStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No record for the given filename or id.
    #[error("ROS2 Rosbag not found: {0}")]
    NotFound(String),

    /// A record for the filename exists and is not in `ERROR` state.
    #[error("ROS2 Rosbag files already exist: {0}")]
    AlreadyExists(String),

    #[error("ROS2 Rosbag file upload is not completed: {0}")]
    UploadNotCompleted(String),

    #[error("ROS2 Rosbag file is already being processed: {0}")]
    AlreadyProcessing(String),
}

#[async_trait]
pub trait RosbagRepository: Send + Sync {
    /// All records, most recently updated first.
    async fn list(&self) -> Result<Vec<RosbagRecord>, RepositoryError>;

    async fn find_by_filename(&self, original_filename: &str) -> Result<Option<RosbagRecord>, RepositoryError>;

    /// Creates the record for an incoming file with upload status
    /// `IN_PROGRESS`. A previous record for the same filename is reused only
    /// when its upload failed.
    async fn begin_upload(&self, file: &UploadFileInfo, filepath: &str) -> Result<RosbagRecord, RepositoryError>;

    /// Marks an upload `COMPLETED` with the stored size, or `ERROR` with the
    /// failure message.
    async fn finish_upload(
        &self,
        original_filename: &str,
        outcome: Result<u64, String>,
    ) -> Result<RosbagRecord, RepositoryError>;

    /// Updates the description of the record identified by `record.id`, or by
    /// `record.original_filename` when no id is given.
    async fn update_description(&self, record: &RosbagRecord) -> Result<RosbagRecord, RepositoryError>;

    /// Moves a completed upload to processing `IN_PROGRESS` in one step.
    /// Fails when the upload is not `COMPLETED` or processing is already
    /// `IN_PROGRESS`.
    async fn begin_processing(&self, original_filename: &str) -> Result<RosbagRecord, RepositoryError>;

    async fn set_process_status(
        &self,
        original_filename: &str,
        status: &str,
        error_msg: Option<String>,
    ) -> Result<RosbagRecord, RepositoryError>;
}

#[derive(Debug, Default)]
struct Records {
    next_id: u64,
    by_filename: BTreeMap<String, RosbagRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryRosbagRepository {
    records: RwLock<Records>,
}

impl InMemoryRosbagRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RosbagRepository for InMemoryRosbagRepository {
    async fn list(&self) -> Result<Vec<RosbagRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut list: Vec<RosbagRecord> = records.by_filename.values().cloned().collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn find_by_filename(&self, original_filename: &str) -> Result<Option<RosbagRecord>, RepositoryError> {
        Ok(self.records.read().await.by_filename.get(original_filename).cloned())
    }

    async fn begin_upload(&self, file: &UploadFileInfo, filepath: &str) -> Result<RosbagRecord, RepositoryError> {
        let mut guard = self.records.write().await;
        let records = &mut *guard;
        let now = Utc::now();

        let (id, created_at, description) = match records.by_filename.get(&file.filename) {
            Some(existing) if !is_status(existing.upload_status.as_deref(), UploadStatus::Error.as_str()) => {
                return Err(RepositoryError::AlreadyExists(file.filename.clone()));
            }
            Some(existing) => (
                existing.id,
                existing.created_at,
                file.description.clone().or_else(|| existing.description.clone()),
            ),
            None => {
                records.next_id += 1;
                (Some(records.next_id), Some(now), file.description.clone())
            }
        };

        let record = RosbagRecord {
            id,
            original_filename: file.filename.clone(),
            description,
            upload_status: Some(UploadStatus::InProgress.as_str().to_string()),
            upload_error_msg: None,
            process_status: None,
            process_error_msg: None,
            size: file.size,
            filepath: Some(filepath.to_string()),
            created_at,
            updated_at: Some(now),
        };
        records.by_filename.insert(file.filename.clone(), record.clone());
        Ok(record)
    }

    async fn finish_upload(
        &self,
        original_filename: &str,
        outcome: Result<u64, String>,
    ) -> Result<RosbagRecord, RepositoryError> {
        let mut records = self.records.write().await;
        let record = records
            .by_filename
            .get_mut(original_filename)
            .ok_or_else(|| RepositoryError::NotFound(original_filename.to_string()))?;

        match outcome {
            Ok(size) => {
                record.size = size;
                record.upload_status = Some(UploadStatus::Completed.as_str().to_string());
                record.upload_error_msg = None;
            }
            Err(message) => {
                record.upload_status = Some(UploadStatus::Error.as_str().to_string());
                record.upload_error_msg = Some(message);
            }
        }
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn update_description(&self, record: &RosbagRecord) -> Result<RosbagRecord, RepositoryError> {
        let mut records = self.records.write().await;
        let stored = match record.id {
            Some(id) => records.by_filename.values_mut().find(|stored| stored.id == Some(id)),
            None => records.by_filename.get_mut(&record.original_filename),
        };
        let stored = stored.ok_or_else(|| {
            RepositoryError::NotFound(match record.id {
                Some(id) => format!("id {}", id),
                None => record.original_filename.clone(),
            })
        })?;

        stored.description = record.description.clone();
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn begin_processing(&self, original_filename: &str) -> Result<RosbagRecord, RepositoryError> {
        let mut records = self.records.write().await;
        let record = records
            .by_filename
            .get_mut(original_filename)
            .ok_or_else(|| RepositoryError::NotFound(original_filename.to_string()))?;

        if !is_status(record.upload_status.as_deref(), UploadStatus::Completed.as_str()) {
            return Err(RepositoryError::UploadNotCompleted(original_filename.to_string()));
        }
        if is_status(record.process_status.as_deref(), ProcessingStatus::InProgress.as_str()) {
            return Err(RepositoryError::AlreadyProcessing(original_filename.to_string()));
        }

        record.process_status = Some(ProcessingStatus::InProgress.as_str().to_string());
        record.process_error_msg = None;
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn set_process_status(
        &self,
        original_filename: &str,
        status: &str,
        error_msg: Option<String>,
    ) -> Result<RosbagRecord, RepositoryError> {
        let mut records = self.records.write().await;
        let record = records
            .by_filename
            .get_mut(original_filename)
            .ok_or_else(|| RepositoryError::NotFound(original_filename.to_string()))?;

        record.process_status = Some(normalize(status));
        record.process_error_msg = error_msg;
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }
}
