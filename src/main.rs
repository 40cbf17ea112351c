use anyhow::Context;
use eframe::CreationContext;
use ros2_rosbag_uploader::app::RosbagApp;
use ros2_rosbag_uploader::config::ClientConfig;
use ros2_rosbag_uploader::logging;

fn main() -> anyhow::Result<()> {
    logging::init()?;

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let app = RosbagApp::new(&config)?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ROS2 Rosbag Uploader",
        options,
        Box::new(move |_cc: &CreationContext| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the uploader window: {e}"))
}
