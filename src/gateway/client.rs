use super::{ApiError, RosbagGateway};
use crate::config::ClientConfig;
use crate::rosbag::{MessageResponse, RosbagRecord, UploadForm};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const API_PATH: &str = "/api/ros2-rosbag";

/// [`RosbagGateway`] over HTTP.
///
/// Every failure, including connection errors, comes back as an
/// [`ApiError`] so callers only ever branch on one shape.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.server_uri.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PATH, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!("request failed before a response: {}", e);
            ApiError::no_response(format!("Failed to send request: {}", e))
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::failure(response).await)
        }
    }

    async fn failure(response: Response) -> ApiError {
        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        let message = body
            .as_ref()
            .and_then(|body| body.get("message").or_else(|| body.get("errMsg")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        let expired = body
            .as_ref()
            .and_then(|body| body.get("reason"))
            .map(|_| true);

        warn!(status = status.as_u16(), "server rejected request: {}", message);
        ApiError {
            err_code: status.as_u16(),
            err_msg: message,
            expired,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::new(status, format!("Failed to parse response: {}", e)))
    }

    async fn upload_form(form: &UploadForm) -> Result<Form, ApiError> {
        let fields = serde_json::to_string(form.files())
            .map_err(|e| ApiError::no_response(format!("Failed to encode file list: {}", e)))?;
        let fields = Part::text(fields)
            .mime_str("application/json")
            .map_err(|e| ApiError::no_response(e.to_string()))?;

        let mut multipart = Form::new().part("fields", fields);
        for file in form.files() {
            let Some(path) = &file.path else {
                return Err(ApiError::no_response(format!(
                    "No local file selected for {}",
                    file.filename
                )));
            };
            let handle = tokio::fs::File::open(path).await.map_err(|e| {
                ApiError::no_response(format!("Failed to read file {}: {}", file.filename, e))
            })?;
            let part = Part::stream_with_length(reqwest::Body::from(handle), file.size)
                .file_name(file.filename.clone());
            multipart = multipart.part("files", part);
        }
        Ok(multipart)
    }
}

#[async_trait]
impl RosbagGateway for HttpGateway {
    async fn list(&self) -> Result<Vec<RosbagRecord>, ApiError> {
        let request = self.client.get(self.url("")).timeout(self.request_timeout);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn validate(&self, form: &UploadForm) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("/validate"))
            .timeout(self.request_timeout)
            .json(form);
        self.send(request).await?;
        Ok(())
    }

    // No timeout: rosbag files can take a long time to transfer.
    async fn upload(&self, form: &UploadForm) -> Result<String, ApiError> {
        let multipart = Self::upload_form(form).await?;
        info!("uploading {} ROS2 Rosbag files", form.files().len());
        let request = self.client.post(self.url("/upload")).multipart(multipart);
        let response = self.send(request).await?;
        let body: MessageResponse = Self::decode(response).await?;
        Ok(body.message)
    }

    async fn update_description(&self, record: &RosbagRecord) -> Result<RosbagRecord, ApiError> {
        let request = self
            .client
            .post(self.url("/description"))
            .timeout(self.request_timeout)
            .json(record);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn send_process_request(&self, record: &RosbagRecord) -> Result<String, ApiError> {
        let request = self
            .client
            .post(self.url("/process"))
            .timeout(self.request_timeout)
            .json(record);
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}
