//! Relay tests against a local mock Dify server. Each test spawns an
//! in-process axum listener standing in for the upstream, so the full
//! validate -> payload -> HTTP call -> reshape chain runs without touching
//! the real API.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use dify_wrapper::config::DifyConfig;
use dify_wrapper::relay::{relay_chat, relay_completion};
use dify_wrapper::translate::api_types::{ChatRequest, CompletionRequest};
use dify_wrapper::{build_router, AppState, SharedLogger, WrapperConfig, WrapperError};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

struct MockDify {
    status: u16,
    body: String,
    hits: AtomicUsize,
    captured: Mutex<Vec<serde_json::Value>>,
}

impl MockDify {
    fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            hits: AtomicUsize::new(0),
            captured: Mutex::new(Vec::new()),
        })
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn captured(&self) -> Vec<serde_json::Value> {
        self.captured.lock().unwrap().clone()
    }
}

async fn mock_handler(
    State(mock): State<Arc<MockDify>>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    mock.captured.lock().unwrap().push(payload);

    Response::builder()
        .status(StatusCode::from_u16(mock.status).unwrap())
        .header("content-type", "application/json")
        .body(Body::from(mock.body.clone()))
        .unwrap()
}

/// Bind the mock on an ephemeral port and return its base URL.
async fn spawn_mock(mock: Arc<MockDify>) -> String {
    let app = Router::new()
        .route("/v1/chat-messages", post(mock_handler))
        .route("/v1/completion-messages", post(mock_handler))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn test_logger(name: &str) -> SharedLogger {
    let path = std::env::temp_dir().join(format!(
        "dify-wrapper-relay-test-{}-{}.log",
        name,
        std::process::id()
    ));
    SharedLogger::new(path).unwrap()
}

/// Config pointing at the mock, with the key stored under a test-unique env
/// var so parallel tests cannot race each other.
fn mock_config(base_url: &str, key_env: &str) -> WrapperConfig {
    std::env::set_var(key_env, "test-api-key");
    WrapperConfig {
        dify: DifyConfig {
            base_url: Some(base_url.to_string()),
            api_key_env: key_env.to_string(),
            environment: None,
        },
        ..WrapperConfig::default()
    }
}

fn chat_body_ok() -> String {
    serde_json::json!({
        "answer": "Hi",
        "conversation_id": "c1",
        "message_id": "m1",
        "created_at": 1_704_067_200u64,
    })
    .to_string()
}

#[tokio::test]
async fn test_chat_success_issues_one_call_and_reshapes() {
    let mock = MockDify::new(200, chat_body_ok());
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_CHAT_OK");

    let req = ChatRequest {
        message: Some("Hello".to_string()),
        conversation_id: None,
        user_id: None,
    };

    let data = relay_chat(&req, &config, &reqwest::Client::new(), &test_logger("chat-ok"))
        .await
        .unwrap();

    assert_eq!(data.message, "Hi");
    assert_eq!(data.conversation_id, "c1");
    assert_eq!(data.message_id, "m1");
    assert_eq!(data.created_at, 1_704_067_200);
    assert_eq!(data.metadata.model, "unknown");
    assert_eq!(data.metadata.tokens, 0);

    assert_eq!(mock.hits(), 1);
    let payload = &mock.captured()[0];
    assert_eq!(payload["query"], "Hello");
    assert_eq!(payload["user"], "default-user");
    assert_eq!(payload["response_mode"], "blocking");
    assert!(payload.get("conversation_id").is_none());
}

#[tokio::test]
async fn test_chat_forwards_conversation_id_when_supplied() {
    let mock = MockDify::new(200, chat_body_ok());
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_CHAT_CONV");

    let req = ChatRequest {
        message: Some("Hello again".to_string()),
        conversation_id: Some("c1".to_string()),
        user_id: Some("user123".to_string()),
    };

    relay_chat(&req, &config, &reqwest::Client::new(), &test_logger("chat-conv"))
        .await
        .unwrap();

    let payload = &mock.captured()[0];
    assert_eq!(payload["conversation_id"], "c1");
    assert_eq!(payload["user"], "user123");
}

#[tokio::test]
async fn test_upstream_error_mirrors_status_and_raw_body() {
    let mock = MockDify::new(429, "rate limited");
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_CHAT_429");

    let req = ChatRequest {
        message: Some("Hello".to_string()),
        conversation_id: None,
        user_id: None,
    };

    let err = relay_chat(&req, &config, &reqwest::Client::new(), &test_logger("chat-429"))
        .await
        .unwrap_err();

    match &err {
        WrapperError::Upstream {
            status, details, ..
        } => {
            assert_eq!(*status, 429);
            assert_eq!(details, "rate limited");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }

    let body = err.to_body();
    assert_eq!(body.error, "Dify API error");
    assert_eq!(body.message, "Request failed with status 429");
    assert_eq!(body.details.as_deref(), Some("rate limited"));
}

#[tokio::test]
async fn test_long_non_ascii_upstream_body_still_mirrored() {
    // Multi-byte char straddling the log-truncation limit; the raw body must
    // come back intact as details, not panic the handler.
    let body = format!("{}é — résumé du détail de l'erreur", "x".repeat(499));
    let mock = MockDify::new(502, body.clone());
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_UTF8_BODY");

    let req = ChatRequest {
        message: Some("Hello".to_string()),
        conversation_id: None,
        user_id: None,
    };

    let err = relay_chat(&req, &config, &reqwest::Client::new(), &test_logger("utf8-body"))
        .await
        .unwrap_err();

    match &err {
        WrapperError::Upstream {
            status, details, ..
        } => {
            assert_eq!(*status, 502);
            assert_eq!(details, &body);
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_key_makes_zero_outbound_calls() {
    let mock = MockDify::new(200, chat_body_ok());
    let base = spawn_mock(mock.clone()).await;

    let config = WrapperConfig {
        dify: DifyConfig {
            base_url: Some(base),
            api_key_env: "DIFY_TEST_KEY_NEVER_SET".to_string(),
            environment: None,
        },
        ..WrapperConfig::default()
    };

    let req = ChatRequest {
        message: Some("Hello".to_string()),
        conversation_id: None,
        user_id: None,
    };

    let err = relay_chat(&req, &config, &reqwest::Client::new(), &test_logger("no-key"))
        .await
        .unwrap_err();
    assert!(matches!(err, WrapperError::Config { .. }));
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn test_missing_message_makes_zero_outbound_calls() {
    let mock = MockDify::new(200, chat_body_ok());
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_NO_MSG");

    let req = ChatRequest {
        message: None,
        conversation_id: None,
        user_id: None,
    };

    let err = relay_chat(&req, &config, &reqwest::Client::new(), &test_logger("no-msg"))
        .await
        .unwrap_err();
    assert!(matches!(err, WrapperError::BadRequest { .. }));
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn test_completion_success_with_defaults() {
    let body = serde_json::json!({
        "answer": "Once upon a time",
        "message_id": "m2",
        "created_at": 1_704_067_200u64,
        "metadata": { "usage": { "model": "gpt-4", "total_tokens": 150 } },
    })
    .to_string();

    let mock = MockDify::new(200, body);
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_COMPLETION");

    let req: CompletionRequest =
        serde_json::from_str(r#"{"inputs":{"text":"Write a story"}}"#).unwrap();

    let data = relay_completion(
        &req,
        &config,
        &reqwest::Client::new(),
        &test_logger("completion-ok"),
    )
    .await
    .unwrap();

    assert_eq!(data.message, "Once upon a time");
    assert_eq!(data.metadata.model, "gpt-4");
    assert_eq!(data.metadata.tokens, 150);

    let payload = &mock.captured()[0];
    assert_eq!(payload["inputs"]["text"], "Write a story");
    assert_eq!(payload["user"], "default-user");
    assert_eq!(payload["response_mode"], "blocking");
    assert!(payload.get("query").is_none());
}

#[tokio::test]
async fn test_unparseable_upstream_body_is_internal_error() {
    let mock = MockDify::new(200, "not json at all");
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_BAD_JSON");

    let req = ChatRequest {
        message: Some("Hello".to_string()),
        conversation_id: None,
        user_id: None,
    };

    let err = relay_chat(&req, &config, &reqwest::Client::new(), &test_logger("bad-json"))
        .await
        .unwrap_err();
    assert!(matches!(err, WrapperError::Json(_)));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_body().error, "Internal server error");
}

// ---------------------------------------------------------------------------
// End-to-end through the router
// ---------------------------------------------------------------------------

fn wrapper_app(config: WrapperConfig, name: &str) -> Router {
    build_router(Arc::new(AppState {
        config,
        client: reqwest::Client::new(),
        logger: test_logger(name),
    }))
}

#[tokio::test]
async fn test_end_to_end_chat_envelope() {
    let mock = MockDify::new(200, chat_body_ok());
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_E2E");

    let response = wrapper_app(config, "e2e")
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message":"Hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "success": true,
            "data": {
                "message": "Hi",
                "conversation_id": "c1",
                "message_id": "m1",
                "created_at": 1_704_067_200u64,
                "metadata": { "model": "unknown", "tokens": 0 },
            },
        })
    );
}

#[tokio::test]
async fn test_end_to_end_upstream_error_envelope() {
    let mock = MockDify::new(429, "rate limited");
    let base = spawn_mock(mock.clone()).await;
    let config = mock_config(&base, "DIFY_TEST_KEY_E2E_429");

    let response = wrapper_app(config, "e2e-429")
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message":"Hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "error": "Dify API error",
            "message": "Request failed with status 429",
            "details": "rate limited",
        })
    );
}
