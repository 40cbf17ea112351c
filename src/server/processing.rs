//! Hand-off of uploaded rosbags to the downstream processing service.
//!
//! Processing runs elsewhere; this module only sends the request and reports
//! whether it was accepted. Completion is reported back through the
//! `/process/status` endpoint.

use crate::rosbag::RosbagRecord;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("processing service is unreachable: {0}")]
    Unreachable(String),

    #[error("processing service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait ProcessingService: Send + Sync {
    /// Submits `record` for processing and returns a human readable status.
    async fn submit(&self, record: &RosbagRecord) -> Result<String, ProcessingError>;
}

/// Posts the record as JSON to a processing service endpoint.
#[derive(Debug, Clone)]
pub struct HttpProcessingService {
    client: reqwest::Client,
    url: String,
}

impl HttpProcessingService {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ProcessingService for HttpProcessingService {
    async fn submit(&self, record: &RosbagRecord) -> Result<String, ProcessingError> {
        let response = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|e| ProcessingError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ProcessingError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        info!(file = %record.original_filename, "processing request accepted");
        let body = body.trim();
        if body.is_empty() {
            Ok(accepted_message(record))
        } else {
            Ok(body.to_string())
        }
    }
}

/// Accepts every request without forwarding it. Used when no processing
/// service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcessingService;

#[async_trait]
impl ProcessingService for NoopProcessingService {
    async fn submit(&self, record: &RosbagRecord) -> Result<String, ProcessingError> {
        info!(file = %record.original_filename, "no processing service configured; request recorded only");
        Ok(accepted_message(record))
    }
}

fn accepted_message(record: &RosbagRecord) -> String {
    format!(
        "Processing request for {} sent! Click the refresh button to get the latest processing status.",
        record.original_filename
    )
}
