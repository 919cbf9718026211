//! OpenAiClient against a local chat-completions stub.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use personagym_llm::{
    CompletionRequest, LlmError, OpenAiClient, OpenAiConfig, RetryPolicy, TextGenerator,
};

#[derive(Default)]
struct StubState {
    /// Number of leading requests answered with 503.
    fail_first: u32,
    /// Status to use instead of 200 for every request, if set.
    always_status: Option<u16>,
    /// Content returned in the first choice.
    content: Option<String>,
    calls: AtomicU32,
    last_body: Mutex<Option<Value>>,
    last_auth: Mutex<Option<String>>,
}

async fn completions(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = Some(body);
    *state.last_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(status) = state.always_status {
        let code = StatusCode::from_u16(status).unwrap();
        return (code, Json(json!({"error": {"message": "stubbed"}})));
    }
    if n < state.fail_first {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"message": "overloaded"}})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": state.content},
                "finish_reason": "stop"
            }]
        })),
    )
}

async fn spawn_stub(state: Arc<StubState>) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}/v1", addr)
}

fn client_for(base_url: &str, retry: RetryPolicy) -> OpenAiClient {
    let config = OpenAiConfig::new("sk-test")
        .with_base_url(base_url)
        .with_model("test-model")
        .with_retry(retry);
    OpenAiClient::new(config).unwrap()
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_retries(max_retries)
        .with_backoff_base_ms(1)
        .with_timeout_ms(5_000)
}

#[tokio::test]
async fn test_complete_returns_first_choice_content() {
    let state = Arc::new(StubState {
        content: Some("Ahoy there!".to_string()),
        ..Default::default()
    });
    let base = spawn_stub(state.clone()).await;
    let client = client_for(&base, fast_retry(0));

    let text = client
        .complete(&CompletionRequest::new("Who are you?").with_system("You are a pirate."))
        .await
        .unwrap();

    assert_eq!(text, "Ahoy there!");
    assert_eq!(client.model(), "test-model");
}

#[tokio::test]
async fn test_request_carries_model_messages_and_bearer_token() {
    let state = Arc::new(StubState {
        content: Some("ok".to_string()),
        ..Default::default()
    });
    let base = spawn_stub(state.clone()).await;
    let client = client_for(&base, fast_retry(0));

    client
        .complete(&CompletionRequest::new("question").with_system("persona"))
        .await
        .unwrap();

    let body = state.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "persona");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "question");
    assert!(body.get("max_tokens").is_none());

    let auth = state.last_auth.lock().unwrap().clone();
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let state = Arc::new(StubState {
        fail_first: 2,
        content: Some("eventually".to_string()),
        ..Default::default()
    });
    let base = spawn_stub(state.clone()).await;
    let client = client_for(&base, fast_retry(2));

    let text = client.complete(&CompletionRequest::new("q")).await.unwrap();

    assert_eq!(text, "eventually");
    assert_eq!(state.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let state = Arc::new(StubState {
        always_status: Some(401),
        ..Default::default()
    });
    let base = spawn_stub(state.clone()).await;
    let client = client_for(&base, fast_retry(3));

    let err = client.complete(&CompletionRequest::new("q")).await.unwrap_err();

    assert!(matches!(err, LlmError::Status { status: 401, .. }));
    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_content_is_an_error() {
    let state = Arc::new(StubState {
        content: None,
        ..Default::default()
    });
    let base = spawn_stub(state).await;
    let client = client_for(&base, fast_retry(0));

    let err = client.complete(&CompletionRequest::new("q")).await.unwrap_err();

    assert!(matches!(err, LlmError::EmptyCompletion { .. }));
}

#[tokio::test]
async fn test_unreachable_service_is_http_error() {
    // Bind and drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}/v1", addr), fast_retry(0));
    let err = client.complete(&CompletionRequest::new("q")).await.unwrap_err();

    assert!(matches!(err, LlmError::Http(_)));
    assert!(err.is_transient());
}
