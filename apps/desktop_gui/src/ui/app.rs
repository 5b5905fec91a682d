use std::sync::Arc;

use client_core::{
    AnalysisError, AttachmentListView, CardBody, FormController, ResultCard, ResultsView,
    RunOutcome, Settings,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{domain::DroppedFile, protocol::AnalysisResult};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::alert::DialogAlerter;
use crate::ui::images::{save_image_as, CardImage, ImageCache};

const QUESTION_INPUT_ID: &str = "question-input";
const DROP_ZONE_ID: &str = "drop-zone";
const ATTACHMENT_LIST_ID: &str = "attachment-list";
const RESULTS_ID: &str = "results";
const CARD_MIN_WIDTH: f32 = 320.0;
const IMAGE_MAX_WIDTH: f32 = 480.0;

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub settings: Settings,
    pub window_title: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            window_title: "Data Analyst Agent".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Question,
    Attachments,
}

/// Picks the receiver of a file drop from the pointer position and the
/// rectangles laid out last frame. Without a known pointer position the
/// drop goes to the attachment list.
pub fn resolve_drop_target(
    pointer: Option<egui::Pos2>,
    question: Option<egui::Rect>,
    drop_zone: Option<egui::Rect>,
) -> Option<DropTarget> {
    let Some(pos) = pointer else {
        return Some(DropTarget::Attachments);
    };
    if question.is_some_and(|rect| rect.contains(pos)) {
        Some(DropTarget::Question)
    } else if drop_zone.is_some_and(|rect| rect.contains(pos)) {
        Some(DropTarget::Attachments)
    } else {
        None
    }
}

pub fn dropped_file_from_egui(file: &egui::DroppedFile) -> DroppedFile {
    let mut dropped = match (&file.path, &file.bytes) {
        (Some(path), _) => DroppedFile::from_path(path.clone()),
        (None, Some(bytes)) => DroppedFile::from_bytes(file.name.clone(), bytes.clone()),
        (None, None) => DroppedFile {
            name: file.name.clone(),
            ..DroppedFile::default()
        },
    };
    if dropped.name.is_empty() {
        dropped.name = file.name.clone();
    }
    if !file.mime.trim().is_empty() {
        dropped = dropped.with_mime_type(file.mime.clone());
    }
    dropped
}

pub struct AnalyzerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    form: FormController,
    images: ImageCache,
    status: String,
    question_rect: Option<egui::Rect>,
    drop_zone_rect: Option<egui::Rect>,
}

impl AnalyzerApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: &StartupConfig,
    ) -> Self {
        let alerter = Arc::new(DialogAlerter::new(startup.window_title.clone()));
        Self {
            cmd_tx,
            ui_rx,
            form: FormController::new(alerter),
            images: ImageCache::default(),
            status: "Starting backend...".to_string(),
            question_rect: None,
            drop_zone_rect: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::PlanTextLoaded(text) => {
                    self.form.apply_plan_text(text);
                    self.status = "Loaded analysis plan".to_string();
                }
                UiEvent::PlanReadFailed(reason) => {
                    self.status =
                        UiError::from_message(UiErrorContext::PlanLoad, reason).status_line();
                }
                UiEvent::AnalysisFinished(outcome) => self.finish_analysis(outcome),
                UiEvent::Error(err) => {
                    tracing::error!(context = ?err.context(), "{}", err.message());
                    self.status = err.status_line();
                    if err.context() == UiErrorContext::BackendStartup
                        && self.form.run_control().is_busy()
                    {
                        self.finish_analysis(Err(AnalysisError::Transport(
                            err.message().to_string(),
                        )));
                    }
                }
            }
        }
    }

    fn finish_analysis(&mut self, outcome: Result<AnalysisResult, AnalysisError>) {
        self.images.clear();
        match self.form.finish_submission(outcome) {
            RunOutcome::Rendered { cards } => {
                self.status = format!("Analysis complete: {cards} result(s)");
            }
            RunOutcome::Failed { message } => {
                self.status =
                    UiError::from_message(UiErrorContext::Analysis, message).status_line();
            }
            RunOutcome::Rejected(_) => {}
        }
    }

    fn start_analysis(&mut self) {
        let Ok(request) = self.form.begin_submission() else {
            return;
        };
        self.images.clear();
        self.status = format!(
            "Submitting analysis with {} attachment(s)...",
            request.attachments.len()
        );
        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Analyze { request },
            &mut self.status,
        ) {
            let reason = self.status.clone();
            self.finish_analysis(Err(AnalysisError::Transport(reason)));
        }
    }

    fn browse_for_files(&mut self) {
        let Some(paths) = rfd::FileDialog::new().set_title("Add Files").pick_files() else {
            return;
        };
        let files: Vec<DroppedFile> = paths.into_iter().map(DroppedFile::from_path).collect();
        let added = self.form.add_dropped(&files);
        self.status = format!("Added {added} file(s)");
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let (dropped, pointer) =
            ctx.input(|i| (i.raw.dropped_files.clone(), i.pointer.latest_pos()));
        if dropped.is_empty() {
            return;
        }
        let files: Vec<DroppedFile> = dropped.iter().map(dropped_file_from_egui).collect();
        match resolve_drop_target(pointer, self.question_rect, self.drop_zone_rect) {
            Some(DropTarget::Question) => {
                if let Some(file) = self.form.accept_plan_drop(&files) {
                    self.status = format!("Reading {}...", file.name);
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::ReadPlanFile { file },
                        &mut self.status,
                    );
                }
            }
            Some(DropTarget::Attachments) => {
                let added = self.form.add_dropped(&files);
                self.status = format!("Added {added} file(s)");
            }
            None => tracing::debug!(count = files.len(), "ignored drop outside form targets"),
        }
    }

    fn hovered_drop_target(&self, ctx: &egui::Context) -> Option<DropTarget> {
        let (hovering, pointer) =
            ctx.input(|i| (!i.raw.hovered_files.is_empty(), i.pointer.latest_pos()));
        if !hovering {
            return None;
        }
        resolve_drop_target(pointer, self.question_rect, self.drop_zone_rect)
    }

    fn show_question_input(&mut self, ui: &mut egui::Ui, highlighted: bool) {
        ui.label(egui::RichText::new("Analysis plan or question").strong());
        let frame = drop_highlight_frame(ui, highlighted);
        let response = frame
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(self.form.question_mut())
                        .id(egui::Id::new(QUESTION_INPUT_ID))
                        .hint_text("Type a question, or drop a text file with your analysis plan here")
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                )
            })
            .response;
        self.question_rect = Some(response.rect);
    }

    fn show_drop_zone(&mut self, ui: &mut egui::Ui, highlighted: bool) {
        ui.label(egui::RichText::new("Attachments").strong());
        let frame = drop_highlight_frame(ui, highlighted);
        let response = frame
            .show(ui, |ui| {
                ui.push_id(DROP_ZONE_ID, |ui| {
                    ui.set_min_height(72.0);
                    ui.horizontal(|ui| {
                        ui.label("Drop files here");
                        if ui.button("Add Files").clicked() {
                            self.browse_for_files();
                        }
                    });
                    ui.separator();
                    self.show_attachment_list(ui);
                });
            })
            .response;
        self.drop_zone_rect = Some(response.rect);
    }

    fn show_attachment_list(&mut self, ui: &mut egui::Ui) {
        let mut remove = None;
        ui.push_id(ATTACHMENT_LIST_ID, |ui| match self.form.attachment_list() {
            AttachmentListView::Placeholder(text) => {
                ui.label(egui::RichText::new(text).weak());
            }
            AttachmentListView::Rows(rows) => {
                for row in rows {
                    ui.horizontal(|ui| {
                        ui.label(row.display_name.as_str());
                        ui.label(egui::RichText::new(row.size_label.as_str()).weak());
                        if ui
                            .small_button("×")
                            .on_hover_text("Remove attachment")
                            .clicked()
                        {
                            remove = Some(row.key.clone());
                        }
                    });
                }
            }
        });
        if let Some(key) = remove {
            self.form.remove_attachment(&key);
        }
    }

    fn show_run_button(&mut self, ui: &mut egui::Ui) {
        let run_control = self.form.run_control();
        let enabled = run_control.is_enabled();
        let busy = run_control.is_busy();
        let label = run_control.label().to_string();
        ui.horizontal(|ui| {
            let response = ui.add_enabled(enabled, egui::Button::new(label));
            if busy {
                ui.spinner();
            }
            if response.clicked() {
                self.start_analysis();
            }
        });
    }

    fn show_results(&mut self, ui: &mut egui::Ui) {
        let scroll = self.form.results_mut().take_scroll_request();
        let images = &mut self.images;
        let status = &mut self.status;
        let view = self.form.results().view();
        if matches!(view, ResultsView::Hidden) {
            return;
        }

        ui.separator();
        let response = ui
            .push_id(RESULTS_ID, |ui| match view {
                ResultsView::Hidden => {}
                ResultsView::Failed(card) => {
                    egui::Frame::group(ui.style())
                        .stroke(egui::Stroke::new(1.5, ui.visuals().error_fg_color))
                        .inner_margin(egui::Margin::same(12))
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width());
                            ui.label(
                                egui::RichText::new(card.title)
                                    .heading()
                                    .color(ui.visuals().error_fg_color),
                            );
                            ui.add(egui::Label::new(card.message.as_str()).wrap());
                        });
                }
                ResultsView::Cards(cards) => {
                    let spacing = ui.spacing().item_spacing.x;
                    let columns =
                        ((ui.available_width() + spacing) / (CARD_MIN_WIDTH + spacing)).max(1.0)
                            as usize;
                    let card_width =
                        (ui.available_width() - spacing * (columns - 1) as f32) / columns as f32;
                    egui::Grid::new("results-grid")
                        .num_columns(columns)
                        .spacing([spacing, spacing])
                        .show(ui, |ui| {
                            for (index, card) in cards.iter().enumerate() {
                                show_result_card(ui, card, card_width, images, status);
                                if (index + 1) % columns == 0 {
                                    ui.end_row();
                                }
                            }
                        });
                }
            })
            .response;
        if scroll {
            response.scroll_to_me(Some(egui::Align::TOP));
        }
    }
}

fn drop_highlight_frame(ui: &egui::Ui, highlighted: bool) -> egui::Frame {
    let visuals = ui.visuals();
    let stroke = if highlighted {
        egui::Stroke::new(2.0, visuals.selection.stroke.color)
    } else {
        visuals.widgets.noninteractive.bg_stroke
    };
    let fill = if highlighted {
        visuals.selection.bg_fill.gamma_multiply(0.25)
    } else {
        egui::Color32::TRANSPARENT
    };
    egui::Frame::group(ui.style())
        .stroke(stroke)
        .fill(fill)
        .inner_margin(egui::Margin::same(8))
}

fn show_result_card(
    ui: &mut egui::Ui,
    card: &ResultCard,
    width: f32,
    images: &mut ImageCache,
    status: &mut String,
) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(10))
        .show(ui, |ui| {
            ui.set_width(width);
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(card.title.as_str()).strong().size(16.0));
                ui.add_space(4.0);
                match &card.body {
                    CardBody::Image { download_name, .. } => {
                        match images.get_or_load(ui.ctx(), card) {
                            Some(CardImage::Ready { texture, size, png }) => {
                                let max_width = width.min(IMAGE_MAX_WIDTH);
                                let scale = (max_width / size.x).min(1.0);
                                ui.add(
                                    egui::Image::from_texture(egui::load::SizedTexture::new(
                                        texture.id(),
                                        *size * scale,
                                    )),
                                );
                                if ui.button(client_core::render::DOWNLOAD_IMAGE_LABEL).clicked() {
                                    match save_image_as(png, download_name) {
                                        Some(Ok(path)) => {
                                            *status = format!("Saved image to {}", path.display());
                                        }
                                        Some(Err(err)) => {
                                            tracing::error!("image download failed: {err:#}");
                                            *status = format!("Failed to save image: {err:#}");
                                        }
                                        None => {}
                                    }
                                }
                            }
                            Some(CardImage::Broken(reason)) => {
                                ui.colored_label(ui.visuals().warn_fg_color, "🖼 broken image")
                                    .on_hover_text(reason.as_str());
                            }
                            None => {}
                        }
                    }
                    CardBody::Preformatted(text) => {
                        egui::Frame::canvas(ui.style())
                            .inner_margin(egui::Margin::same(6))
                            .show(ui, |ui| {
                                ui.set_width(ui.available_width());
                                ui.add(
                                    egui::Label::new(egui::RichText::new(text.as_str()).monospace()).wrap(),
                                );
                            });
                    }
                    CardBody::Text(text) => {
                        ui.add(egui::Label::new(text.as_str()).wrap());
                    }
                }
            });
        });
}

impl eframe::App for AnalyzerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_dropped_files(ctx);
        let hovered = self.hovered_drop_target(ctx);

        egui::TopBottomPanel::bottom("status-bar").show(ctx, |ui| {
            ui.label(egui::RichText::new(self.status.as_str()).small());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.heading("Data Analysis");
                    ui.add_space(8.0);
                    self.show_question_input(ui, hovered == Some(DropTarget::Question));
                    ui.add_space(8.0);
                    self.show_drop_zone(ui, hovered == Some(DropTarget::Attachments));
                    ui.add_space(8.0);
                    self.show_run_button(ui);
                    self.show_results(ui);
                });
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
