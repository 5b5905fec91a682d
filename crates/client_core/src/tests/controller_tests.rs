use super::*;
use crate::render::CardBody;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingAlerter {
    alerts: Mutex<Vec<String>>,
}

impl RecordingAlerter {
    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alerts lock").clone()
    }
}

impl Alerter for RecordingAlerter {
    fn alert(&self, message: &str) {
        self.alerts
            .lock()
            .expect("alerts lock")
            .push(message.to_string());
    }
}

enum Reply {
    Ok(serde_json::Value),
    Status(u16, &'static str),
    Network(&'static str),
}

struct FakeTransport {
    reply: Reply,
    seen: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeTransport {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl AnalysisTransport for FakeTransport {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.seen.lock().expect("seen lock").push((
            request.question.clone(),
            request.attachments.iter().map(|a| a.name.clone()).collect(),
        ));
        match &self.reply {
            Reply::Ok(value) => AnalysisResult::try_from(value.clone())
                .map_err(|_| AnalysisError::Parse("expected a JSON object".into())),
            Reply::Status(code, body) => Err(AnalysisError::Server {
                status: StatusCode::from_u16(*code).expect("status"),
                body: body.to_string(),
            }),
            Reply::Network(message) => Err(AnalysisError::Transport(message.to_string())),
        }
    }
}

fn controller() -> (FormController, Arc<RecordingAlerter>) {
    let alerter = Arc::new(RecordingAlerter::default());
    (FormController::new(alerter.clone()), alerter)
}

fn long_base64() -> String {
    "iVBORw0KGgo".repeat(12)
}

#[tokio::test]
async fn blank_question_never_reaches_the_transport() {
    for question in ["", "   ", "\n\t  \n"] {
        let (mut form, alerter) = controller();
        let transport = FakeTransport::new(Reply::Ok(json!({})));
        form.set_question(question);

        let outcome = form.run(&transport).await;

        assert_eq!(outcome, RunOutcome::Rejected(InputError::EmptyQuestion));
        assert!(transport.calls().is_empty());
        assert_eq!(alerter.alerts(), ["Please enter an analysis plan or question."]);
        assert_eq!(form.run_control().label(), DEFAULT_RUN_LABEL);
        assert!(form.run_control().is_enabled());
        assert!(!form.results().is_visible());
    }
}

#[tokio::test]
async fn blank_question_leaves_previous_results_in_place() {
    let (mut form, _alerter) = controller();
    let transport = FakeTransport::new(Reply::Ok(json!({"edge_count": 5})));
    form.set_question("count edges");
    form.run(&transport).await;
    assert!(form.results().is_visible());

    form.set_question("  ");
    form.run(&transport).await;
    assert!(form.results().is_visible());
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn submits_trimmed_question_with_every_attachment_once() {
    let (mut form, alerter) = controller();
    let transport = FakeTransport::new(Reply::Ok(json!({"edge_count": 5})));
    form.set_question("  How many edges?\n");
    form.add_attachments([
        Attachment::from_bytes("edges.csv", None, b"a,b\n".to_vec()),
        Attachment::from_bytes("notes.txt", None, b"n".to_vec()),
        Attachment::from_bytes("edges.csv", None, b"c,d\n".to_vec()),
    ]);

    let outcome = form.run(&transport).await;

    assert_eq!(outcome, RunOutcome::Rendered { cards: 1 });
    assert_eq!(
        transport.calls(),
        vec![(
            "How many edges?".to_string(),
            vec!["edges.csv".to_string(), "notes.txt".to_string()]
        )]
    );
    assert!(alerter.alerts().is_empty());
    // the question box keeps what the user typed
    assert_eq!(form.question(), "  How many edges?\n");
}

#[tokio::test]
async fn success_renders_cards_and_requests_scroll() {
    let (mut form, _alerter) = controller();
    let image = long_base64();
    let transport = FakeTransport::new(Reply::Ok(json!({
        "edge_count": 5,
        "summary_png": image,
    })));
    form.set_question("summarize");

    form.run(&transport).await;

    let ResultsView::Cards(cards) = form.results().view() else {
        panic!("expected cards, got {:?}", form.results().view());
    };
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].title, "Edge Count");
    assert_eq!(cards[0].body, CardBody::Text("5".into()));
    assert_eq!(cards[1].title, "Summary Png");
    assert!(matches!(
        &cards[1].body,
        CardBody::Image { download_name, .. } if download_name == "summary_png.png"
    ));

    assert!(form.results_mut().take_scroll_request());
    assert!(!form.results_mut().take_scroll_request());
}

#[tokio::test]
async fn server_error_shows_single_error_card() {
    let (mut form, _alerter) = controller();
    let transport = FakeTransport::new(Reply::Status(500, "internal error"));
    form.set_question("count edges");
    form.add_attachments([Attachment::from_bytes("edges.csv", None, b"a".to_vec())]);

    let outcome = form.run(&transport).await;

    let ResultsView::Failed(card) = form.results().view() else {
        panic!("expected error card");
    };
    assert_eq!(card.title, "Analysis Failed");
    assert!(card.message.contains("500"));
    assert!(card.message.contains("internal error"));
    assert_eq!(
        outcome,
        RunOutcome::Failed {
            message: "Server Error: 500 - internal error".to_string()
        }
    );

    // nothing the user entered is touched
    assert_eq!(form.question(), "count edges");
    assert_eq!(form.attachments().len(), 1);
}

#[tokio::test]
async fn run_control_is_restored_after_every_outcome() {
    let replies = [
        Reply::Ok(json!({"a": 1})),
        Reply::Status(502, "bad gateway"),
        Reply::Network("connection refused"),
    ];
    for reply in replies {
        let alerter = Arc::new(RecordingAlerter::default());
        let mut form = FormController::with_run_label(alerter, "Go");
        form.set_question("q");
        let transport = FakeTransport::new(reply);

        form.run(&transport).await;

        assert!(form.run_control().is_enabled());
        assert!(!form.run_control().is_busy());
        assert_eq!(form.run_control().label(), "Go");
    }
}

#[test]
fn begin_submission_enters_busy_state_and_clears_results() {
    let (mut form, _alerter) = controller();
    form.set_question("first");
    form.begin_submission().expect("request");
    form.finish_submission(Ok(AnalysisResult::default()));
    assert!(form.results().is_visible());

    let request = form.begin_submission().expect("request");
    assert_eq!(request.question, "first");
    assert!(!form.run_control().is_enabled());
    assert!(form.run_control().is_busy());
    assert_eq!(form.run_control().label(), RUNNING_LABEL);
    assert_eq!(form.results().view(), &ResultsView::Hidden);

    form.finish_submission(Err(AnalysisError::Parse("expected value".into())));
    assert_eq!(form.run_control().label(), DEFAULT_RUN_LABEL);
}

#[test]
fn repeated_begin_keeps_the_original_label() {
    let (mut form, _alerter) = controller();
    form.set_question("q");
    form.begin_submission().expect("first");
    form.begin_submission().expect("second");
    form.finish_submission(Ok(AnalysisResult::default()));
    assert_eq!(form.run_control().label(), DEFAULT_RUN_LABEL);
}

#[tokio::test]
async fn text_drop_replaces_question() {
    let (mut form, alerter) = controller();
    form.set_question("old plan");
    let dropped = [DroppedFile::from_bytes("plan.txt", b"new plan".to_vec())];

    assert!(form.load_plan(&dropped).await);
    assert_eq!(form.question(), "new plan");
    assert!(alerter.alerts().is_empty());
}

#[tokio::test]
async fn non_text_drop_alerts_and_keeps_question() {
    let (mut form, alerter) = controller();
    form.set_question("keep me");
    let dropped = [DroppedFile::from_bytes("chart.png", vec![0x89, b'P', b'N', b'G'])];

    assert!(!form.load_plan(&dropped).await);
    assert_eq!(form.question(), "keep me");
    assert_eq!(alerter.alerts(), ["Please drop a text file for the analysis plan."]);
}

#[tokio::test]
async fn unreadable_plan_keeps_question_without_alert() {
    let (mut form, alerter) = controller();
    form.set_question("keep me");
    let dropped = [DroppedFile::from_path("/definitely/not/here/plan.txt")];

    assert!(!form.load_plan(&dropped).await);
    assert_eq!(form.question(), "keep me");
    assert!(alerter.alerts().is_empty());
}

#[test]
fn dropped_files_are_deduplicated_and_removable() {
    let (mut form, _alerter) = controller();
    let dropped = [
        DroppedFile::from_bytes("edges.csv", b"a,b".to_vec()),
        DroppedFile::from_bytes("edges.csv", b"c,d".to_vec()),
        DroppedFile::from_path("/definitely/not/here.csv"),
    ];
    assert_eq!(form.add_dropped(&dropped), 1);

    let AttachmentListView::Rows(rows) = form.attachment_list() else {
        panic!("expected rows");
    };
    assert_eq!(rows.len(), 1);

    assert!(form.remove_attachment(&rows[0].key));
    assert!(matches!(
        form.attachment_list(),
        AttachmentListView::Placeholder(_)
    ));
    assert_eq!(form.add_dropped(&dropped[..1]), 1);
}
