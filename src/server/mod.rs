//! The ROS2 rosbag HTTP service.

pub mod api;
pub mod processing;
pub mod repository;
pub mod router;
