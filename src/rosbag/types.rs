use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for one uploaded rosbag file, as stored by the server.
///
/// `original_filename` is the natural key: the client list and the server
/// repository both de-duplicate on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosbagRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub original_filename: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub upload_status: Option<String>,
    #[serde(default)]
    pub upload_error_msg: Option<String>,
    #[serde(default)]
    pub process_status: Option<String>,
    #[serde(default)]
    pub process_error_msg: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RosbagRecord {
    pub fn new(original_filename: impl Into<String>, size: u64) -> Self {
        Self {
            id: None,
            original_filename: original_filename.into(),
            description: None,
            upload_status: None,
            upload_error_msg: None,
            process_status: None,
            process_error_msg: None,
            size,
            filepath: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_upload_status(mut self, status: impl Into<String>) -> Self {
        self.upload_status = Some(status.into());
        self
    }

    pub fn with_process_status(mut self, status: impl Into<String>) -> Self {
        self.process_status = Some(status.into());
        self
    }
}

/// One file selected for upload.
///
/// `path` only exists on the client; the server sees the filename, size and
/// optional description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFileInfo {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl UploadFileInfo {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
            description: None,
            path: None,
        }
    }

    pub fn from_path(path: PathBuf, size: u64) -> Option<Self> {
        let filename = path.file_name()?.to_str()?.to_string();
        Some(Self {
            filename,
            size,
            description: None,
            path: Some(path),
        })
    }
}

/// The set of files submitted in one upload action.
///
/// `fields` is `None` when the form carried no file list at all, which is
/// rejected the same way as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadForm {
    #[serde(default)]
    pub fields: Option<Vec<UploadFileInfo>>,
}

impl UploadForm {
    pub fn new(files: Vec<UploadFileInfo>) -> Self {
        Self {
            fields: Some(files),
        }
    }

    pub fn files(&self) -> &[UploadFileInfo] {
        self.fields.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Status report posted back by the processing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatusUpdate {
    pub original_filename: String,
    pub process_status: String,
    #[serde(default)]
    pub process_error_msg: Option<String>,
}
