//! ROS2 rosbag API handlers.

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use axum::extract::State;
use axum::Json;
use std::collections::HashSet;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::error::Error;
use super::AppState;
use crate::rosbag::status::is_status;
use crate::rosbag::validation::EMPTY_FILES_MESSAGE;
use crate::rosbag::{
    MessageResponse, ProcessStatusUpdate, ProcessingStatus, RosbagRecord, UploadFileInfo,
    UploadForm, UploadStatus,
};
use crate::store::{ObjectEntry, ObjectStoreLister};
use crate::utils::file_size::format_size;

/// List every rosbag record, most recently updated first.
pub async fn list_rosbags(State(state): State<AppState>) -> Result<Json<Vec<RosbagRecord>>, Error> {
    Ok(Json(state.repository.list().await?))
}

/// Check a file list before any bytes are sent.
pub async fn validate_rosbags(
    State(state): State<AppState>,
    Json(form): Json<UploadForm>,
) -> Result<Json<MessageResponse>, Error> {
    check_upload(&state, form.fields.as_deref()).await?;
    Ok(Json(MessageResponse {
        message: format!("{} ROS2 Rosbag files are valid", form.files().len()),
    }))
}

/// Collects every reason the declared files cannot be uploaded.
async fn check_upload(state: &AppState, files: Option<&[UploadFileInfo]>) -> Result<(), Error> {
    let files = match files {
        Some(files) if !files.is_empty() => files,
        _ => return Err(Error::BadRequest(String::from(EMPTY_FILES_MESSAGE))),
    };

    let mut messages = Vec::new();
    let mut seen = HashSet::new();
    let mut existing = Vec::new();

    for file in files {
        if !state.accepted_extensions.accepts(&file.filename) {
            messages.push(state.accepted_extensions.invalid_file_message(&file.filename));
        }
        if file.size > state.max_upload_size {
            messages.push(format!(
                "File size exceeds limit ({}): {}",
                format_size(state.max_upload_size),
                file.filename
            ));
        }
        if !seen.insert(file.filename.as_str()) {
            messages.push(format!("Duplicate files in request: {}", file.filename));
        }
        if let Some(record) = state.repository.find_by_filename(&file.filename).await? {
            if !is_status(record.upload_status.as_deref(), UploadStatus::Error.as_str()) {
                existing.push(file.filename.clone());
            }
        }
    }

    if !existing.is_empty() {
        messages.push(format!("ROS2 Rosbag files already exist: {}", existing.join(", ")));
    }

    if messages.is_empty() {
        Ok(())
    } else {
        warn!("rejected ROS2 Rosbag upload: {}", messages.join("; "));
        Err(Error::BadRequest(messages.join("; ")))
    }
}

/// Receive a multipart upload.
///
/// The `fields` part (a JSON file list) must come first; each following
/// `files` part is streamed into the bucket under its file name. Records move
/// `IN_PROGRESS` → `COMPLETED`, or `ERROR` when storing fails.
pub async fn upload_rosbags(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, Error> {
    let mut declared: Option<Vec<UploadFileInfo>> = None;
    let mut received = HashSet::new();
    let mut failed = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("fields") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(format!("invalid multipart body: {}", e)))?;
                let files: Vec<UploadFileInfo> = serde_json::from_str(&text)
                    .map_err(|e| Error::BadRequest(format!("invalid file list: {}", e)))?;
                check_upload(&state, Some(files.as_slice())).await?;
                declared = Some(files);
            }
            Some("files") => {
                let Some(files) = declared.as_ref() else {
                    return Err(Error::BadRequest(String::from(
                        "file list must precede file contents",
                    )));
                };
                let filename = field.file_name().map(str::to_string).unwrap_or_default();
                let Some(info) = files.iter().find(|file| file.filename == filename) else {
                    return Err(Error::BadRequest(format!("undeclared file: {}", filename)));
                };
                if !received.insert(filename.clone()) {
                    return Err(Error::BadRequest(format!("file sent twice: {}", filename)));
                }

                let record = receive_file(&state, info, field).await?;
                if let Some(message) = record.upload_error_msg {
                    failed.push(format!("{}: {}", record.original_filename, message));
                }
            }
            other => warn!(field = ?other, "ignoring unexpected multipart field"),
        }
    }

    let Some(files) = declared else {
        return Err(Error::BadRequest(String::from(EMPTY_FILES_MESSAGE)));
    };
    for file in files.iter().filter(|file| !received.contains(&file.filename)) {
        failed.push(format!("{}: file contents missing", file.filename));
    }

    if !failed.is_empty() {
        return Err(Error::Upload(format!(
            "Failed to upload ROS2 Rosbag files: {}",
            failed.join("; ")
        )));
    }

    info!("stored {} ROS2 Rosbag files", files.len());
    Ok(Json(MessageResponse {
        message: format!("Uploaded {} ROS2 Rosbag files", files.len()),
    }))
}

/// Message recorded when a request ends while its file is still streaming.
const INTERRUPTED_MESSAGE: &str = "Upload was interrupted before the file was received";

async fn receive_file(
    state: &AppState,
    info: &UploadFileInfo,
    field: Field<'_>,
) -> Result<RosbagRecord, Error> {
    state
        .repository
        .begin_upload(info, state.bucket.name())
        .await?;
    let mut pending = PendingUpload {
        state: state.clone(),
        filename: Some(info.filename.clone()),
    };

    let outcome = write_object(state, &info.filename, field).await;
    if let Err(message) = &outcome {
        warn!(file = %info.filename, "upload failed: {}", message);
        if let Err(e) = state.bucket.remove(&info.filename).await {
            warn!(file = %info.filename, "failed to remove partial object: {}", e);
        }
    }

    let record = state
        .repository
        .finish_upload(&info.filename, outcome)
        .await?;
    pending.filename = None;
    Ok(record)
}

/// Marks a record `ERROR` if its upload future is dropped mid-stream, for
/// example when the client disconnects.
struct PendingUpload {
    state: AppState,
    filename: Option<String>,
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        let Some(filename) = self.filename.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(file = %filename, "no runtime to clean up an interrupted upload");
            return;
        };

        let state = self.state.clone();
        handle.spawn(async move {
            warn!(file = %filename, "upload interrupted");
            if let Err(e) = state.bucket.remove(&filename).await {
                warn!(file = %filename, "failed to remove partial object: {}", e);
            }
            if let Err(e) = state
                .repository
                .finish_upload(&filename, Err(String::from(INTERRUPTED_MESSAGE)))
                .await
            {
                warn!(file = %filename, "failed to mark interrupted upload: {}", e);
            }
        });
    }
}

async fn write_object(state: &AppState, key: &str, mut field: Field<'_>) -> Result<u64, String> {
    let mut object = state.bucket.create(key).await.map_err(|e| e.to_string())?;
    let mut written = 0u64;

    while let Some(chunk) = field.chunk().await.map_err(|e| e.to_string())? {
        written += chunk.len() as u64;
        if written > state.max_upload_size {
            return Err(format!(
                "File size exceeds limit ({})",
                format_size(state.max_upload_size)
            ));
        }
        object.write_all(&chunk).await.map_err(|e| e.to_string())?;
    }

    object.flush().await.map_err(|e| e.to_string())?;
    Ok(written)
}

/// Update a record's description.
pub async fn update_description(
    State(state): State<AppState>,
    Json(record): Json<RosbagRecord>,
) -> Result<Json<RosbagRecord>, Error> {
    let updated = state.repository.update_description(&record).await?;
    info!(file = %updated.original_filename, "updated ROS2 Rosbag description");
    Ok(Json(updated))
}

/// Send a completed upload to the processing service.
///
/// The record is moved to `IN_PROGRESS` before the request goes out, so a
/// second request for the same file is refused while the first is pending.
pub async fn process_rosbag(
    State(state): State<AppState>,
    Json(record): Json<RosbagRecord>,
) -> Result<Json<String>, Error> {
    let filename = record.original_filename;
    let claimed = state.repository.begin_processing(&filename).await?;

    match state.processing.submit(&claimed).await {
        Ok(status) => {
            info!(file = %filename, "sent processing request");
            Ok(Json(status))
        }
        Err(err) => {
            state
                .repository
                .set_process_status(&filename, ProcessingStatus::Error.as_str(), Some(err.to_string()))
                .await?;
            Err(err.into())
        }
    }
}

/// Record a status reported by the processing service.
pub async fn update_process_status(
    State(state): State<AppState>,
    Json(update): Json<ProcessStatusUpdate>,
) -> Result<Json<RosbagRecord>, Error> {
    let status = update
        .process_status
        .parse::<ProcessingStatus>()
        .map_err(|e| Error::BadRequest(e.to_string()))?;
    if status == ProcessingStatus::Na {
        return Err(Error::BadRequest(String::from(
            "NA is a filter value and cannot be stored",
        )));
    }

    let record = state
        .repository
        .set_process_status(&update.original_filename, status.as_str(), update.process_error_msg)
        .await?;
    info!(file = %record.original_filename, status = %status, "processing status reported");
    Ok(Json(record))
}

/// List every object in the bucket.
pub async fn list_objects(State(state): State<AppState>) -> Result<Json<Vec<ObjectEntry>>, Error> {
    let objects = ObjectStoreLister::new(state.bucket.as_ref()).list_all().await?;
    Ok(Json(objects))
}
