//! API state and routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

use crate::rosbag::AcceptedExtensions;
use crate::server::processing::ProcessingService;
use crate::server::repository::RosbagRepository;
use crate::store::LocalBucket;

pub mod error;
pub mod ros2_rosbag;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Rosbag record storage.
    pub repository: Arc<dyn RosbagRepository>,
    /// Bucket receiving uploaded files.
    pub bucket: Arc<LocalBucket>,
    /// Downstream processing hand-off.
    pub processing: Arc<dyn ProcessingService>,
    /// Extensions accepted for upload.
    pub accepted_extensions: AcceptedExtensions,
    /// Largest accepted file in bytes.
    pub max_upload_size: u64,
}

/// Create the `/ros2-rosbag` routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ros2-rosbag", get(ros2_rosbag::list_rosbags))
        .route("/ros2-rosbag/validate", post(ros2_rosbag::validate_rosbags))
        .route(
            "/ros2-rosbag/upload",
            post(ros2_rosbag::upload_rosbags).layer(DefaultBodyLimit::disable()),
        )
        .route("/ros2-rosbag/description", post(ros2_rosbag::update_description))
        .route("/ros2-rosbag/process", post(ros2_rosbag::process_rosbag))
        .route(
            "/ros2-rosbag/process/status",
            post(ros2_rosbag::update_process_status),
        )
        .route("/ros2-rosbag/objects", get(ros2_rosbag::list_objects))
        .with_state(state)
}
