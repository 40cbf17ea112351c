//! Upload, validation and processing hand-off for ROS2 rosbag files.
//!
//! The crate ships two binaries: a desktop client (`ros2_rosbag_uploader`)
//! and the HTTP service it talks to (`ros2_rosbag_server`).

pub mod app;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod rosbag;
pub mod server;
pub mod store;
pub mod utils;
pub mod workflow;
