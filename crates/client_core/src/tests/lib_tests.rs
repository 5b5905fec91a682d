use super::*;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use shared::domain::AttachmentSource;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct ServerState {
    status: StatusCode,
    body: &'static str,
    content_type: &'static str,
    received: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
}

async fn handle_analyze(State(state): State<ServerState>, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    state.received.lock().await.push(parts);
    (
        state.status,
        [(axum::http::header::CONTENT_TYPE, state.content_type)],
        state.body,
    )
        .into_response()
}

async fn spawn_analysis_server(
    status: StatusCode,
    body: &'static str,
    content_type: &'static str,
) -> anyhow::Result<(Url, Arc<Mutex<Vec<Vec<ReceivedPart>>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        status,
        body,
        content_type,
        received: received.clone(),
    };
    let app = Router::new()
        .route("/analyze", post(handle_analyze))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((Url::parse(&format!("http://{addr}/analyze"))?, received))
}

fn sample_request() -> AnalysisRequest {
    AnalysisRequest::new(
        "How many edges?",
        vec![
            Attachment::from_bytes("edges.csv", Some("text/csv".into()), b"a,b\n".to_vec()),
            Attachment::from_bytes("photo.jpg", None, vec![0xff, 0xd8, 0xff]),
        ],
    )
}

#[tokio::test]
async fn posts_question_part_and_one_part_per_attachment() {
    let (endpoint, received) =
        spawn_analysis_server(StatusCode::OK, r#"{"edge_count": 5}"#, "application/json")
            .await
            .expect("spawn server");
    let client = HttpAnalysisClient::new(endpoint);

    let result = client.analyze(&sample_request()).await.expect("analyze");
    assert_eq!(result.0.get("edge_count"), Some(&serde_json::json!(5)));

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    let parts = &received[0];
    let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["questions.txt", "edges.csv", "photo.jpg"]);

    assert_eq!(parts[0].file_name.as_deref(), Some("questions.txt"));
    assert_eq!(parts[0].content_type.as_deref(), Some("text/plain"));
    assert_eq!(parts[0].bytes, b"How many edges?");

    assert_eq!(parts[1].file_name.as_deref(), Some("edges.csv"));
    assert_eq!(parts[1].content_type.as_deref(), Some("text/csv"));
    assert_eq!(parts[1].bytes, b"a,b\n");

    assert_eq!(
        parts[2].content_type.as_deref(),
        Some("application/octet-stream")
    );
    assert_eq!(parts[2].bytes, vec![0xff, 0xd8, 0xff]);
}

#[tokio::test]
async fn non_success_status_carries_code_and_body_text() {
    let (endpoint, _received) = spawn_analysis_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal error",
        "text/plain",
    )
    .await
    .expect("spawn server");
    let client = HttpAnalysisClient::new(endpoint);

    let err = client
        .analyze(&sample_request())
        .await
        .expect_err("must fail");
    assert_eq!(err.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.to_string(), "Server Error: 500 - internal error");
}

#[tokio::test]
async fn invalid_json_is_a_parse_error() {
    let (endpoint, _received) =
        spawn_analysis_server(StatusCode::OK, "<html>oops</html>", "text/html")
            .await
            .expect("spawn server");
    let client = HttpAnalysisClient::new(endpoint);

    let err = client
        .analyze(&sample_request())
        .await
        .expect_err("must fail");
    assert!(matches!(err, AnalysisError::Parse(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn non_object_json_is_a_parse_error() {
    let (endpoint, _received) =
        spawn_analysis_server(StatusCode::OK, "[1, 2, 3]", "application/json")
            .await
            .expect("spawn server");
    let client = HttpAnalysisClient::new(endpoint);

    let err = client
        .analyze(&sample_request())
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("got an array"), "unexpected error: {err}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let endpoint = Url::parse(&format!("http://{addr}/analyze")).expect("url");
    let err = HttpAnalysisClient::new(endpoint)
        .analyze(&sample_request())
        .await
        .expect_err("must fail");
    assert!(matches!(err, AnalysisError::Transport(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn missing_attachment_file_fails_before_sending() {
    let (endpoint, received) =
        spawn_analysis_server(StatusCode::OK, "{}", "application/json")
            .await
            .expect("spawn server");
    let request = AnalysisRequest::new(
        "q",
        vec![Attachment {
            name: "gone.csv".into(),
            size: 10,
            mime_type: None,
            source: AttachmentSource::Path("/definitely/not/here/gone.csv".into()),
        }],
    );

    let err = HttpAnalysisClient::new(endpoint)
        .analyze(&request)
        .await
        .expect_err("must fail");
    assert!(matches!(err, AnalysisError::Attachment { ref name, .. } if name == "gone.csv"));
    assert!(received.lock().await.is_empty());
}

#[tokio::test]
async fn controller_round_trip_against_http_server() {
    struct Silent;
    impl Alerter for Silent {
        fn alert(&self, _message: &str) {}
    }

    let (endpoint, received) = spawn_analysis_server(
        StatusCode::OK,
        r#"{"edge_count": 5, "degrees": {"a": 2}}"#,
        "application/json",
    )
    .await
    .expect("spawn server");
    let client = HttpAnalysisClient::new(endpoint);
    let mut form = FormController::new(Arc::new(Silent));
    form.set_question("  count edges  ");
    form.add_attachments([Attachment::from_bytes("edges.csv", None, b"a,b".to_vec())]);

    let outcome = form.run(&client).await;

    assert_eq!(outcome, RunOutcome::Rendered { cards: 2 });
    let received = received.lock().await;
    let parts = &received[0];
    assert_eq!(parts[0].bytes, b"count edges");
    assert_eq!(parts.len(), 2);
}
