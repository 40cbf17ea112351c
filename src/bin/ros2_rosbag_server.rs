//! HTTP service receiving ROS2 rosbag uploads.

use anyhow::Context;
use ros2_rosbag_uploader::config::ServerConfig;
use ros2_rosbag_uploader::logging;
use ros2_rosbag_uploader::server::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    router::run(config).await
}
