use axum::{
    body::Body,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use story_service::{
    build_app,
    completion::{CompletionConfig, OpenAiCompletion},
    retry::RetryPolicy,
    AppState,
};
use tower::ServiceExt;

#[derive(Clone, Copy)]
enum Mode {
    Stories,
    RateLimited,
    Unauthorized,
    Slow,
}

struct MockOpenAi {
    mode: Mode,
    hits: AtomicUsize,
    seen: Mutex<Vec<(Option<String>, Value)>>,
}

impl MockOpenAi {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

async fn mock_chat_completions(
    State(mock): State<Arc<MockOpenAi>>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let hit = mock.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    mock.seen.lock().unwrap().push((auth, request));

    match mock.mode {
        Mode::Stories => {
            let content = if hit == 0 { "A story." } else { "A funny story." };
            (StatusCode::OK, Json(completion_body(content)))
        }
        Mode::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": {"message": "Rate limit reached for requests", "type": "requests"}})),
        ),
        Mode::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}})),
        ),
        Mode::Slow => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, Json(completion_body("too late")))
        }
    }
}

async fn spawn_mock_openai_server(mode: Mode) -> (String, Arc<MockOpenAi>) {
    let mock = Arc::new(MockOpenAi {
        mode,
        hits: AtomicUsize::new(0),
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/v1/chat/completions", post(mock_chat_completions))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), mock)
}

fn build_test_app(api_key: &str, base_url: &str, timeout_ms: u64) -> Router {
    let config = CompletionConfig::new(api_key, base_url, "gpt-3.5-turbo", timeout_ms);
    build_app(AppState::new(
        Arc::new(OpenAiCompletion::new(config)),
        RetryPolicy::default(),
    ))
}

fn story_request() -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/v2/write_story")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"topic":"dragons","style":"Sad"}"#))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn e2e_story_through_openai_backend() {
    let (base_url, mock) = spawn_mock_openai_server(Mode::Stories).await;
    let app = build_test_app("sk-test", &base_url, 5_000);

    let response = app.oneshot(story_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["original_story"], "A story.");
    assert_eq!(body["funny_story"], "A funny story.");
    assert_eq!(body["style"], "Sad");

    let seen = mock.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    let (auth, first) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(first["model"], "gpt-3.5-turbo");
    assert_eq!(first["messages"][0]["role"], "system");
    assert_eq!(first["messages"][1]["role"], "user");
    assert_eq!(
        first["messages"][1]["content"],
        "write a story under 500 words about dragons in the style of Sad"
    );
    assert_eq!(
        seen[1].1["messages"][1]["content"],
        "Rewrite this story in a funny way: A story."
    );
}

#[tokio::test]
async fn e2e_upstream_rate_limit_is_retried_then_429() {
    let (base_url, mock) = spawn_mock_openai_server(Mode::RateLimited).await;
    let app = build_test_app("sk-test", &base_url, 5_000);

    let response = app.oneshot(story_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "Rate limit reached for requests"})
    );
    assert_eq!(mock.hits(), 3);
}

#[tokio::test]
async fn e2e_upstream_auth_error_is_mirrored_once() {
    let (base_url, mock) = spawn_mock_openai_server(Mode::Unauthorized).await;
    let app = build_test_app("sk-wrong", &base_url, 5_000);

    let response = app.oneshot(story_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "Incorrect API key provided"})
    );
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn e2e_slow_upstream_times_out_with_408() {
    let (base_url, mock) = spawn_mock_openai_server(Mode::Slow).await;
    let app = build_test_app("sk-test", &base_url, 100);

    let response = app.oneshot(story_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(mock.hits(), 3);
}

#[tokio::test]
async fn e2e_missing_api_key_never_calls_upstream() {
    let (base_url, mock) = spawn_mock_openai_server(Mode::Stories).await;
    let app = build_test_app("", &base_url, 5_000);

    let response = app.oneshot(story_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(mock.hits(), 0);
}
