//! Client-side orchestration of the rosbag page.
//!
//! [`RosbagWorkflow`] owns the record list, the alert slot and the upload
//! phase. Each user action is split in two: a dispatch method that updates
//! state synchronously and returns a [`Task`] holding the network call, and
//! [`RosbagWorkflow::apply`] which folds the finished [`Outcome`] back into
//! state. The UI thread never awaits; it spawns tasks and applies outcomes as
//! they arrive.
//!
//! Outcomes are applied in arrival order. A refresh and an upload that are in
//! flight together both replace state when they land, and the record list ends
//! up as whichever list result was applied last.

pub mod notification;
mod state;

pub use notification::{Alert, NotificationSlot, Severity, Ticket};
pub use state::{LocallyValidated, ServerValidated, UploadPhase};

use crate::gateway::{ApiError, RosbagGateway};
use crate::rosbag::validation::validate_files;
use crate::rosbag::{AcceptedExtensions, FilterCriteria, RosbagRecord, UploadForm};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

pub const ERROR_TITLE: &str = "Error";
pub const UPLOAD_ERROR_TITLE: &str = "Error upload";
pub const UPLOAD_TITLE: &str = "ROS2 Rosbag files upload";
pub const PROCESS_TITLE: &str = "Processing Request Status";

pub const UPLOAD_SENT_MESSAGE: &str = "ROS2 Rosbag files upload request sent! Please DO NOT close this window until the ROS2 Rosbag files upload completed! Click the refresh button to get the latest upload status.";
pub const UPLOAD_DONE_MESSAGE: &str = "Server responds with ROS2 Rosbag files upload end! Click the refresh button to get the latest upload status.";
pub const UPLOAD_BUSY_MESSAGE: &str = "A ROS2 Rosbag files upload is already in progress. Wait for it to finish before starting another.";

/// A pending network call that resolves to an [`Outcome`].
pub type Task = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// Result of a finished [`Task`], tagged with the alert ticket reserved when
/// it was dispatched.
#[derive(Debug)]
pub enum Outcome {
    Listed {
        ticket: Ticket,
        result: Result<Vec<RosbagRecord>, ApiError>,
    },
    Filtered {
        ticket: Ticket,
        criteria: FilterCriteria,
        result: Result<Vec<RosbagRecord>, ApiError>,
    },
    DescriptionSaved {
        ticket: Ticket,
        result: Result<RosbagRecord, ApiError>,
    },
    ProcessRequested {
        ticket: Ticket,
        result: Result<String, ApiError>,
    },
    ServerValidated {
        ticket: Ticket,
        result: Result<ServerValidated, ApiError>,
    },
    Uploaded {
        ticket: Ticket,
        result: Result<String, ApiError>,
    },
}

pub struct RosbagWorkflow<G: ?Sized> {
    gateway: Arc<G>,
    accepted_extensions: AcceptedExtensions,
    records: Vec<RosbagRecord>,
    notifications: NotificationSlot,
    phase: UploadPhase,
}

impl<G> RosbagWorkflow<G>
where
    G: RosbagGateway + ?Sized + 'static,
{
    pub fn new(gateway: Arc<G>, accepted_extensions: AcceptedExtensions) -> Self {
        Self {
            gateway,
            accepted_extensions,
            records: Vec::new(),
            notifications: NotificationSlot::new(),
            phase: UploadPhase::Idle,
        }
    }

    pub fn records(&self) -> &[RosbagRecord] {
        &self.records
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn accepted_extensions(&self) -> &AcceptedExtensions {
        &self.accepted_extensions
    }

    pub fn alert(&self) -> &Alert {
        self.notifications.current()
    }

    pub fn alert_ticket(&self) -> Ticket {
        self.notifications.current_ticket()
    }

    pub fn close_alert(&mut self, seen: Ticket) {
        self.notifications.close(seen);
    }

    /// Re-fetches the full list; the result replaces the current list.
    pub fn refresh(&mut self) -> Task {
        let ticket = self.notifications.reserve();
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let result = gateway.list().await;
            Outcome::Listed { ticket, result }
        })
    }

    /// Re-fetches the full list and keeps the records matching `criteria`.
    pub fn filter(&mut self, criteria: FilterCriteria) -> Task {
        let ticket = self.notifications.reserve();
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let result = gateway.list().await;
            Outcome::Filtered {
                ticket,
                criteria,
                result,
            }
        })
    }

    pub fn save_description(&mut self, record: RosbagRecord) -> Task {
        let ticket = self.notifications.reserve();
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let result = gateway.update_description(&record).await;
            Outcome::DescriptionSaved { ticket, result }
        })
    }

    pub fn request_processing(&mut self, record: RosbagRecord) -> Task {
        let ticket = self.notifications.reserve();
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let result = gateway.send_process_request(&record).await;
            Outcome::ProcessRequested { ticket, result }
        })
    }

    // On failure the phase returns to idle and one alert lists every
    // offending file.
    fn validate_locally(&mut self, form: UploadForm) -> Option<LocallyValidated> {
        self.phase = UploadPhase::LocallyValidating;
        match validate_files(form.fields.as_deref(), &self.accepted_extensions) {
            Ok(files) => {
                info!("{} ROS2 Rosbag files passed local validation", files.len());
                Some(LocallyValidated::new(form))
            }
            Err(messages) => {
                let ticket = self.notifications.reserve();
                self.reject_upload(ticket, messages);
                None
            }
        }
    }

    /// Starts an upload action: local validation, then server validation.
    ///
    /// Returns `None` when nothing needs to be awaited, either because local
    /// validation failed or because another upload is still running. The
    /// upload itself is dispatched by [`apply`](Self::apply) once the server
    /// accepts the files.
    pub fn start_upload(&mut self, form: UploadForm) -> Option<Task> {
        if !self.phase.is_idle() {
            warn!(phase = ?self.phase, "upload requested while another is running");
            self.notifications
                .raise(Alert::warning(UPLOAD_TITLE, UPLOAD_BUSY_MESSAGE));
            return None;
        }
        let validated = self.validate_locally(form)?;
        Some(self.validate_on_server(validated))
    }

    fn validate_on_server(&mut self, validated: LocallyValidated) -> Task {
        self.phase = UploadPhase::ServerValidating {
            files: validated.form().files().len(),
        };
        let ticket = self.notifications.reserve();
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let result = gateway.validate(validated.form()).await;
            let result = result.map(|()| validated.accept());
            Outcome::ServerValidated { ticket, result }
        })
    }

    fn upload(&mut self, validated: ServerValidated) -> Task {
        self.phase = UploadPhase::Uploading {
            files: validated.form().files().len(),
        };
        self.notifications
            .raise(Alert::warning(UPLOAD_TITLE, UPLOAD_SENT_MESSAGE));
        let ticket = self.notifications.reserve();
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let form = validated.into_form();
            let result = gateway.upload(&form).await;
            Outcome::Uploaded { ticket, result }
        })
    }

    fn reject_upload(&mut self, ticket: Ticket, messages: Vec<String>) {
        warn!("ROS2 Rosbag upload rejected: {}", messages.join("; "));
        self.phase = UploadPhase::Idle;
        self.notifications
            .publish(ticket, Alert::error(UPLOAD_ERROR_TITLE, messages));
    }

    fn publish_error(&mut self, ticket: Ticket, err: ApiError) {
        warn!(code = err.err_code, "ROS2 Rosbag request failed: {}", err.err_msg);
        self.notifications
            .publish(ticket, Alert::error(ERROR_TITLE, vec![err.err_msg]));
    }

    /// Folds a finished task back into state. Returns the follow-up task when
    /// the outcome continues an upload.
    pub fn apply(&mut self, outcome: Outcome) -> Option<Task> {
        match outcome {
            Outcome::Listed { ticket, result } => match result {
                Ok(records) => {
                    info!("loaded {} ROS2 Rosbag records", records.len());
                    self.records = records;
                }
                Err(err) => self.publish_error(ticket, err),
            },
            Outcome::Filtered {
                ticket,
                criteria,
                result,
            } => match result {
                Ok(records) => {
                    self.records = criteria.apply(records);
                    info!(?criteria, matched = self.records.len(), "filtered ROS2 Rosbag records");
                }
                Err(err) => self.publish_error(ticket, err),
            },
            Outcome::DescriptionSaved { ticket, result } => match result {
                Ok(updated) => {
                    self.records
                        .retain(|record| record.original_filename != updated.original_filename);
                    self.records.insert(0, updated);
                }
                Err(err) => self.publish_error(ticket, err),
            },
            Outcome::ProcessRequested { ticket, result } => match result {
                Ok(status) => {
                    self.notifications
                        .publish(ticket, Alert::success(PROCESS_TITLE, status));
                }
                Err(err) => self.publish_error(ticket, err),
            },
            Outcome::ServerValidated { ticket, result } => match result {
                Ok(validated) => return Some(self.upload(validated)),
                Err(err) => self.reject_upload(ticket, vec![err.err_msg]),
            },
            Outcome::Uploaded { ticket, result } => {
                self.phase = UploadPhase::Idle;
                match result {
                    Ok(ack) => {
                        info!("upload finished: {}", ack);
                        self.notifications
                            .publish(ticket, Alert::success(UPLOAD_TITLE, UPLOAD_DONE_MESSAGE));
                    }
                    Err(err) => self.publish_error(ticket, err),
                }
            }
        }
        None
    }

    /// Awaits `task` and every follow-up it produces, applying each outcome.
    pub async fn run(&mut self, task: Task) {
        let mut next = Some(task);
        while let Some(task) = next {
            let outcome = task.await;
            next = self.apply(outcome);
        }
    }
}
