use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use webhook_probe::{EventEnvelope, ProbeOutcome, WebhookSender};

#[derive(Clone, Default)]
struct AppState {
    seen_content_type: Arc<Mutex<Option<String>>>,
}

#[tokio::test]
async fn e2e_echoed_response_matches_the_sent_envelope() {
    let server = TestServer::start().await;
    let envelope = EventEnvelope::synthetic_text_message("U1234567890");

    let outcome = WebhookSender::new()
        .deliver(server.url("/webhook"), &envelope)
        .await;

    let expected_body = sonic_rs::to_string(&envelope).expect("envelope should serialize");
    assert_eq!(outcome.console_line(), format!("Response: {expected_body}"));
    assert!(outcome.console_line().contains(r#""userId":"U1234567890""#));
}

#[tokio::test]
async fn e2e_request_carries_json_content_type() {
    let server = TestServer::start().await;
    let envelope = EventEnvelope::synthetic_text_message("U1234567890");

    let _ = WebhookSender::new()
        .deliver(server.url("/webhook"), &envelope)
        .await;

    let seen = server
        .state
        .seen_content_type
        .lock()
        .expect("test state mutex poisoned")
        .clone();
    assert_eq!(seen.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn e2e_refused_connection_prints_error_line_and_no_response_line() {
    // Bind then drop to get a port with nothing listening on it.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let envelope = EventEnvelope::synthetic_text_message("U1234567890");
    let outcome = WebhookSender::new()
        .deliver(format!("http://{addr}/webhook"), &envelope)
        .await;

    let line = outcome.console_line();
    assert!(line.starts_with("Error: "), "got line: {line}");
    assert!(!line.contains("Response:"));
    assert!(matches!(outcome, ProbeOutcome::Failed(_)));
}

struct TestServer {
    base_url: String,
    state: AppState,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/webhook", post(echo_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn echo_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Bytes {
    let content_type = headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    *state
        .seen_content_type
        .lock()
        .expect("test state mutex poisoned") = content_type;
    body
}
