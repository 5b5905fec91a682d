//! Form controller: owns the question, the attachment collection, the run
//! control and the results area, and drives one analysis run at a time.
//!
//! Front-ends bind their widgets to this state and forward user gestures to
//! it. The two suspension points (reading a dropped plan file, the network
//! round trip) are split into a synchronous start and finish so a UI can run
//! the slow part elsewhere; [`FormController::load_plan`] and
//! [`FormController::run`] compose them for callers that can simply await.

use std::sync::Arc;

use shared::{
    domain::{Attachment, AttachmentKey, DroppedFile},
    error::InputError,
    protocol::{AnalysisRequest, AnalysisResult},
};

use crate::{
    attachments::{attachment_from_dropped, AttachmentListView, AttachmentSet},
    error::AnalysisError,
    plan_loader::{read_plan_text, select_plan_file},
    render::{render_results, ErrorCard, ResultCard},
    AnalysisTransport,
};

pub const DEFAULT_RUN_LABEL: &str = "Run Analysis";
pub const RUNNING_LABEL: &str = "Running Analysis...";

/// Blocking, user-facing notification for input errors.
pub trait Alerter: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunControl {
    label: String,
    enabled: bool,
    busy: bool,
    original_label: Option<String>,
}

impl RunControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            busy: false,
            original_label: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn enter_busy(&mut self) {
        if !self.busy {
            self.original_label = Some(std::mem::replace(
                &mut self.label,
                RUNNING_LABEL.to_string(),
            ));
        }
        self.enabled = false;
        self.busy = true;
    }

    fn restore(&mut self) {
        if let Some(label) = self.original_label.take() {
            self.label = label;
        }
        self.enabled = true;
        self.busy = false;
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new(DEFAULT_RUN_LABEL)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultsView {
    #[default]
    Hidden,
    Cards(Vec<ResultCard>),
    Failed(ErrorCard),
}

#[derive(Debug, Clone, Default)]
pub struct ResultsPanel {
    view: ResultsView,
    scroll_requested: bool,
}

impl ResultsPanel {
    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.view, ResultsView::Hidden)
    }

    /// Returns true once after results were rendered, so the front-end can
    /// bring the results area into view.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    fn hide(&mut self) {
        self.view = ResultsView::Hidden;
        self.scroll_requested = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Rejected(InputError),
    Rendered { cards: usize },
    Failed { message: String },
}

pub struct FormController {
    question: String,
    attachments: AttachmentSet,
    run_control: RunControl,
    results: ResultsPanel,
    alerter: Arc<dyn Alerter>,
}

impl FormController {
    pub fn new(alerter: Arc<dyn Alerter>) -> Self {
        Self::with_run_label(alerter, DEFAULT_RUN_LABEL)
    }

    pub fn with_run_label(alerter: Arc<dyn Alerter>, run_label: impl Into<String>) -> Self {
        Self {
            question: String::new(),
            attachments: AttachmentSet::new(),
            run_control: RunControl::new(run_label),
            results: ResultsPanel::default(),
            alerter,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Direct binding for a text box.
    pub fn question_mut(&mut self) -> &mut String {
        &mut self.question
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn attachments(&self) -> &AttachmentSet {
        &self.attachments
    }

    pub fn run_control(&self) -> &RunControl {
        &self.run_control
    }

    pub fn results(&self) -> &ResultsPanel {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultsPanel {
        &mut self.results
    }

    pub fn attachment_list(&self) -> AttachmentListView {
        self.attachments.render()
    }

    pub fn add_attachments(&mut self, files: impl IntoIterator<Item = Attachment>) -> usize {
        let added = self.attachments.add(files);
        tracing::debug!(added, total = self.attachments.len(), "attachments updated");
        added
    }

    /// Adds dropped or picked files. Files whose metadata cannot be read are
    /// logged and left out.
    pub fn add_dropped(&mut self, dropped: &[DroppedFile]) -> usize {
        let candidates: Vec<Attachment> = dropped
            .iter()
            .filter_map(|file| match attachment_from_dropped(file) {
                Ok(attachment) => Some(attachment),
                Err(err) => {
                    tracing::warn!(name = %file.name, "ignoring dropped file: {err:#}");
                    None
                }
            })
            .collect();
        self.add_attachments(candidates)
    }

    pub fn remove_attachment(&mut self, key: &AttachmentKey) -> bool {
        let removed = self.attachments.remove(key);
        tracing::debug!(name = %key.name, removed, "attachment removal requested");
        removed
    }

    /// First half of a question-box drop: returns the file to read, or alerts
    /// and returns `None` when the drop is not a text file.
    pub fn accept_plan_drop(&self, dropped: &[DroppedFile]) -> Option<DroppedFile> {
        match select_plan_file(dropped) {
            Ok(file) => Some(file.clone()),
            Err(err) => {
                self.alerter.alert(&err.to_string());
                None
            }
        }
    }

    /// Second half of a question-box drop: replaces the question wholesale.
    pub fn apply_plan_text(&mut self, text: String) {
        self.question = text;
    }

    /// Returns whether the question was replaced.
    pub async fn load_plan(&mut self, dropped: &[DroppedFile]) -> bool {
        let Some(file) = self.accept_plan_drop(dropped) else {
            return false;
        };
        match read_plan_text(&file).await {
            Ok(text) => {
                self.apply_plan_text(text);
                true
            }
            Err(err) => {
                tracing::warn!(name = %file.name, "failed to read dropped plan: {err:#}");
                false
            }
        }
    }

    /// Validates the question and, when it is non-empty, puts the form into
    /// its busy state and returns the request to send. An empty question
    /// raises an alert and changes nothing.
    pub fn begin_submission(&mut self) -> Result<AnalysisRequest, InputError> {
        let question = self.question.trim();
        if question.is_empty() {
            let err = InputError::EmptyQuestion;
            self.alerter.alert(&err.to_string());
            return Err(err);
        }

        let request = AnalysisRequest::new(question, self.attachments.snapshot());
        self.run_control.enter_busy();
        self.results.hide();
        tracing::info!(
            question_len = request.question.len(),
            attachments = request.attachments.len(),
            "sending analysis request"
        );
        Ok(request)
    }

    /// Renders the outcome of a run started with [`Self::begin_submission`]
    /// and restores the run control whatever the outcome.
    pub fn finish_submission(
        &mut self,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> RunOutcome {
        let run_outcome = match outcome {
            Ok(result) => {
                let cards = render_results(&result);
                let count = cards.len();
                self.results.view = ResultsView::Cards(cards);
                self.results.scroll_requested = true;
                tracing::info!(cards = count, "analysis results rendered");
                RunOutcome::Rendered { cards: count }
            }
            Err(err) => {
                tracing::error!(error = %err, "analysis failed");
                let message = err.to_string();
                self.results.view = ResultsView::Failed(ErrorCard::new(message.clone()));
                RunOutcome::Failed { message }
            }
        };
        self.run_control.restore();
        run_outcome
    }

    pub async fn run<T>(&mut self, transport: &T) -> RunOutcome
    where
        T: AnalysisTransport + ?Sized,
    {
        let request = match self.begin_submission() {
            Ok(request) => request,
            Err(err) => return RunOutcome::Rejected(err),
        };
        let outcome = transport.analyze(&request).await;
        self.finish_submission(outcome)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
