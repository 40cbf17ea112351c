mod state;
mod ui;

use crate::config::ClientConfig;
use crate::gateway::HttpGateway;
use crate::rosbag::{FilterCriteria, RosbagRecord, UploadForm};
use crate::workflow::{Outcome, RosbagWorkflow, Task};
use anyhow::Context;
use eframe::{egui, App};
pub use state::{collect_folder, PageState};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(150);

/// The rosbag page: record table, filters, upload controls and the alert.
///
/// Network calls run on a private tokio runtime. Their outcomes come back
/// over a channel and are applied on the UI thread in [`update_state`].
///
/// [`update_state`]: RosbagApp::update_state
pub struct RosbagApp {
    workflow: RosbagWorkflow<HttpGateway>,
    runtime: Runtime,
    sender: Sender<Outcome>,
    receiver: Receiver<Outcome>,
    pending: usize,
    page: PageState,
    server_uri: String,
}

impl RosbagApp {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let runtime = Runtime::new().context("failed to start the async runtime")?;
        let gateway = Arc::new(HttpGateway::new(config));
        let (sender, receiver) = channel();

        let mut app = Self {
            workflow: RosbagWorkflow::new(gateway, config.accepted_extensions.clone()),
            runtime,
            sender,
            receiver,
            pending: 0,
            page: PageState::default(),
            server_uri: config.server_uri.clone(),
        };
        info!(server = %app.server_uri, "initializing ROS2 Rosbag uploader");
        app.refresh();
        Ok(app)
    }

    fn spawn(&mut self, task: Task) {
        let sender = self.sender.clone();
        self.pending += 1;
        self.runtime.spawn(async move {
            let outcome = task.await;
            sender.send(outcome).unwrap_or_default();
        });
    }

    pub fn refresh(&mut self) {
        let task = self.workflow.refresh();
        self.spawn(task);
    }

    pub fn apply_filter(&mut self) {
        let task = self.workflow.filter(self.page.criteria.clone());
        self.spawn(task);
    }

    pub fn clear_filter(&mut self) {
        self.page.criteria = FilterCriteria::default();
        self.refresh();
    }

    pub fn pick_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new().pick_files() {
            let added = self.page.add_files(paths);
            debug!("selected {} file(s)", added);
        }
    }

    pub fn pick_folder(&mut self) {
        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
            self.add_folder(&folder);
        }
    }

    fn add_folder(&mut self, folder: &Path) {
        let added = self
            .page
            .add_folder(folder, self.workflow.accepted_extensions());
        info!(folder = %folder.display(), "selected {} file(s) from folder", added);
    }

    /// Submits the current selection. The selection is kept when the upload
    /// is rejected before any request is sent, so it can be corrected.
    pub fn start_upload(&mut self) {
        let files = self
            .page
            .selection
            .iter()
            .cloned()
            .map(|mut file| {
                if file.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
                    file.description = None;
                }
                file
            })
            .collect();
        let form = UploadForm::new(files);
        if let Some(task) = self.workflow.start_upload(form) {
            self.page.clear_selection();
            self.spawn(task);
        }
    }

    pub fn save_description(&mut self, record: &RosbagRecord) {
        let edited = self.page.finish_edit(record);
        let task = self.workflow.save_description(edited);
        self.spawn(task);
    }

    pub fn request_processing(&mut self, record: RosbagRecord) {
        let task = self.workflow.request_processing(record);
        self.spawn(task);
    }

    /// Applies finished outcomes and dispatches any follow-up tasks.
    pub fn update_state(&mut self, ctx: &egui::Context) {
        let mut had_updates = false;

        while let Ok(outcome) = self.receiver.try_recv() {
            had_updates = true;
            self.pending = self.pending.saturating_sub(1);
            if let Some(next) = self.workflow.apply(outcome) {
                self.spawn(next);
            }
        }

        if had_updates {
            ctx.request_repaint();
        }
        if self.pending > 0 {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

impl App for RosbagApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
