use super::RosbagApp;
use crate::rosbag::status::is_status;
use crate::rosbag::{ProcessingStatus, RosbagRecord, UploadStatus};
use crate::utils::file_size::format_size;
use crate::workflow::Severity;
use eframe::egui::{self, Align, Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);
const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
const WARNING: Color32 = Color32::from_rgb(230, 160, 0);
const FAILURE: Color32 = Color32::from_rgb(220, 50, 50);

enum RowAction {
    Edit(RosbagRecord),
    Cancel,
    Save(RosbagRecord),
    Process(RosbagRecord),
}

impl RosbagApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("ROS2 Rosbag Uploader");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new(format!("Server: {}", self.server_uri))
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_alert(ui);
                self.render_upload(ui);

                ui.add_space(20.0);
                self.render_filters(ui);

                ui.add_space(10.0);
                self.render_table(ui);
                ui.add_space(20.0);
            });
        });
    }

    fn render_alert(&mut self, ui: &mut egui::Ui) {
        let alert = self.workflow.alert();
        if !alert.open {
            return;
        }

        let ticket = self.workflow.alert_ticket();
        let color = severity_color(alert.severity);
        let title = alert.title.clone();
        let messages = alert.message.clone();
        let mut close = false;

        egui::Frame::none()
            .fill(color.gamma_multiply(0.15))
            .stroke(egui::Stroke::new(1.0, color))
            .inner_margin(10.0)
            .rounding(4.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(title).strong().color(color));
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("✖").clicked() {
                            close = true;
                        }
                    });
                });
                for message in &messages {
                    ui.label(message.as_str());
                }
            });
        ui.add_space(10.0);

        if close {
            self.workflow.close_alert(ticket);
        }
    }

    fn render_upload(&mut self, ui: &mut egui::Ui) {
        let phase = self.workflow.phase();
        let accepted = self.workflow.accepted_extensions().as_slice().join(", ");

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Upload ROS2 Rosbag files").strong());
                ui.add_space(4.0);
                ui.label("ℹ").on_hover_text_at_pointer(format!(
                    "Accepted extensions: {}\n\
                    Folders are searched recursively; files listed in .gitignore are skipped.",
                    accepted
                ));
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("📄 Select Files").clicked() {
                    self.pick_files();
                }
                if ui.button("📁 Select Folder").clicked() {
                    self.pick_folder();
                }
                let has_selection = !self.page.selection.is_empty();
                if ui
                    .add_enabled(has_selection, egui::Button::new("🗑 Clear"))
                    .clicked()
                {
                    self.page.clear_selection();
                }
            });

            if !self.page.selection.is_empty() {
                ui.add_space(8.0);
                if ui
                    .button(format!(
                        "{} {} file(s), {}",
                        if self.page.show_selection { "▼" } else { "▶" },
                        self.page.selection.len(),
                        format_size(self.page.total_size())
                    ))
                    .clicked()
                {
                    self.page.show_selection = !self.page.show_selection;
                }

                if self.page.show_selection {
                    let mut removed = None;
                    egui::Grid::new("selection")
                        .num_columns(4)
                        .striped(true)
                        .show(ui, |ui| {
                            for (index, file) in self.page.selection.iter_mut().enumerate() {
                                ui.label(file.filename.as_str());
                                ui.label(format_size(file.size));
                                let description = file.description.get_or_insert_with(String::new);
                                ui.add(
                                    egui::TextEdit::singleline(description)
                                        .hint_text("Description (optional)"),
                                );
                                if ui.small_button("✖").clicked() {
                                    removed = Some(index);
                                }
                                ui.end_row();
                            }
                        });
                    if let Some(index) = removed {
                        self.page.remove(index);
                    }
                }
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let can_upload = phase.is_idle() && !self.page.selection.is_empty();
                let button =
                    egui::Button::new("📤 Upload Files").min_size(egui::vec2(200.0, 32.0));
                if ui.add_enabled(can_upload, button).clicked() {
                    self.start_upload();
                }
                if !phase.is_idle() {
                    ui.spinner();
                    ui.label(phase.status_text());
                }
            });
        });
    }

    fn render_filters(&mut self, ui: &mut egui::Ui) {
        let mut search = false;
        let mut clear = false;
        let mut refresh = false;

        ui.horizontal_wrapped(|ui| {
            status_combo(
                ui,
                "upload_status",
                "Upload status",
                &mut self.page.criteria.upload_status,
                UploadStatus::ALL.iter().map(UploadStatus::as_str),
            );
            status_combo(
                ui,
                "processing_status",
                "Processing status",
                &mut self.page.criteria.processing_status,
                ProcessingStatus::ALL.iter().map(ProcessingStatus::as_str),
            );

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.page.criteria.filter_text)
                    .hint_text("Filename or description")
                    .desired_width(200.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                search = true;
            }
            if ui.button("🔍 Search").clicked() {
                search = true;
            }
            if ui.button("Clear").clicked() {
                clear = true;
            }
            if ui.button("🔄 Refresh").clicked() {
                refresh = true;
            }
        });

        if clear {
            self.clear_filter();
        } else if search {
            self.apply_filter();
        } else if refresh {
            self.refresh();
        }
    }

    fn render_table(&mut self, ui: &mut egui::Ui) {
        let records = self.workflow.records();
        if records.is_empty() {
            ui.label(
                RichText::new("No ROS2 Rosbag files")
                    .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
            return;
        }

        let mut action = None;
        egui::Grid::new("rosbags")
            .num_columns(7)
            .striped(true)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                for header in ["File", "Size", "Description", "Upload", "Processing", "Updated", ""] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for record in records {
                    ui.label(record.original_filename.as_str());
                    ui.label(format_size(record.size));

                    if self.page.editing.as_deref() == Some(record.original_filename.as_str()) {
                        ui.horizontal(|ui| {
                            let draft = self
                                .page
                                .drafts
                                .entry(record.original_filename.clone())
                                .or_default();
                            ui.add(egui::TextEdit::singleline(draft).desired_width(180.0));
                            if ui.small_button("💾").on_hover_text("Save").clicked() {
                                action = Some(RowAction::Save(record.clone()));
                            }
                            if ui.small_button("✖").on_hover_text("Cancel").clicked() {
                                action = Some(RowAction::Cancel);
                            }
                        });
                    } else {
                        ui.horizontal(|ui| {
                            ui.label(record.description.as_deref().unwrap_or_default());
                            if ui.small_button("✏").on_hover_text("Edit description").clicked() {
                                action = Some(RowAction::Edit(record.clone()));
                            }
                        });
                    }

                    status_label(ui, record.upload_status.as_deref(), record.upload_error_msg.as_deref());
                    status_label(ui, record.process_status.as_deref(), record.process_error_msg.as_deref());
                    ui.label(
                        record
                            .updated_at
                            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_default(),
                    );

                    let can_process =
                        is_status(record.upload_status.as_deref(), UploadStatus::Completed.as_str());
                    if ui
                        .add_enabled(can_process, egui::Button::new("⚙ Process"))
                        .clicked()
                    {
                        action = Some(RowAction::Process(record.clone()));
                    }
                    ui.end_row();
                }
            });

        match action {
            Some(RowAction::Edit(record)) => self.page.begin_edit(&record),
            Some(RowAction::Cancel) => self.page.cancel_edit(),
            Some(RowAction::Save(record)) => self.save_description(&record),
            Some(RowAction::Process(record)) => self.request_processing(record),
            None => {}
        }
    }
}

fn status_combo<'a>(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    value: &mut String,
    options: impl Iterator<Item = &'a str>,
) {
    ui.label(label);
    let selected = if value.is_empty() {
        String::from("Any")
    } else {
        value.clone()
    };
    egui::ComboBox::from_id_source(id)
        .selected_text(selected)
        .show_ui(ui, |ui| {
            ui.selectable_value(value, String::new(), "Any");
            for option in options {
                ui.selectable_value(value, option.to_string(), option);
            }
        });
}

fn status_label(ui: &mut egui::Ui, status: Option<&str>, error: Option<&str>) {
    let color = if is_status(status, UploadStatus::Completed.as_str()) {
        SUCCESS
    } else if is_status(status, UploadStatus::Error.as_str()) {
        FAILURE
    } else if is_status(status, UploadStatus::InProgress.as_str()) {
        ACCENT
    } else {
        ui.visuals().text_color().gamma_multiply(0.7)
    };

    let text = status.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("-");
    let response = ui.colored_label(color, text);
    if let Some(error) = error.filter(|e| !e.is_empty()) {
        response.on_hover_text(error);
    }
}

fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Success => SUCCESS,
        Severity::Info => ACCENT,
        Severity::Warning => WARNING,
        Severity::Error => FAILURE,
    }
}
