//! Client side of the `/api/ros2-rosbag` contract.

mod client;

pub use client::HttpGateway;

use crate::rosbag::{RosbagRecord, UploadForm};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error code used when no HTTP response was received.
pub const NO_RESPONSE_CODE: u16 = 0;

/// Uniform failure shape for every gateway operation.
///
/// Serialized as `{"errCode": .., "errMsg": ..}`; the server sends the same
/// body on every non-2xx response. `expired` is only present when the failure
/// body carried a `reason`, which marks an expired session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{err_msg} (code {err_code})")]
pub struct ApiError {
    pub err_code: u16,
    pub err_msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

impl ApiError {
    pub fn new(err_code: u16, err_msg: impl Into<String>) -> Self {
        Self {
            err_code,
            err_msg: err_msg.into(),
            expired: None,
        }
    }

    pub fn no_response(err_msg: impl Into<String>) -> Self {
        Self::new(NO_RESPONSE_CODE, err_msg)
    }
}

/// The five rosbag operations the workflow controller consumes.
#[async_trait]
pub trait RosbagGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<RosbagRecord>, ApiError>;

    async fn validate(&self, form: &UploadForm) -> Result<(), ApiError>;

    /// Success means the server accepted the files, not that any downstream
    /// work finished.
    async fn upload(&self, form: &UploadForm) -> Result<String, ApiError>;

    async fn update_description(&self, record: &RosbagRecord) -> Result<RosbagRecord, ApiError>;

    /// Returns the server's human readable status for the request.
    async fn send_process_request(&self, record: &RosbagRecord) -> Result<String, ApiError>;
}
