use crate::config::WrapperConfig;
use crate::cors;
use crate::error::WrapperError;
use crate::logging::SharedLogger;
use crate::relay;
use crate::translate::api_types::{
    ApiResponse, ChatRequest, CompletionRequest, EndpointMap, HealthConfiguration, HealthResponse,
    HealthStatus, DEFAULT_USER_ID,
};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: WrapperConfig,
    pub client: reqwest::Client,
    pub logger: SharedLogger,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index).fallback(get_only))
        .route(
            "/chat",
            get(handle_chat_docs)
                .post(handle_chat)
                .fallback(chat_post_only),
        )
        .route(
            "/completion",
            post(handle_completion).fallback(completion_post_only),
        )
        .route("/health", get(handle_health).fallback(get_only))
        .fallback(handle_not_found)
        .layer(middleware::from_fn(cors::allow_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let req: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            state
                .logger
                .error("server", format!("Failed to parse chat request: {}", e));
            return WrapperError::bad_request(format!("Invalid request body: {}", e))
                .into_response();
        }
    };

    state.logger.info(
        "server",
        format!(
            "Chat request: has_conversation={} user={}",
            req.conversation_id.is_some(),
            req.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
        ),
    );

    match relay::relay_chat(&req, &state.config, &state.client, &state.logger).await {
        Ok(data) => Json(ApiResponse::success(data)).into_response(),
        Err(e) => {
            state.logger.error("server", format!("Chat relay error: {}", e));
            e.into_response()
        }
    }
}

async fn handle_completion(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    // An empty body means "all defaults" for completions.
    let req: CompletionRequest = if body.is_empty() {
        CompletionRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                state
                    .logger
                    .error("server", format!("Failed to parse completion request: {}", e));
                return WrapperError::bad_request(format!("Invalid request body: {}", e))
                    .into_response();
            }
        }
    };

    state.logger.info(
        "server",
        format!("Completion request: inputs={}", req.inputs.len()),
    );

    match relay::relay_completion(&req, &state.config, &state.client, &state.logger).await {
        Ok(data) => Json(ApiResponse::success(data)).into_response(),
        Err(e) => {
            state
                .logger
                .error("server", format!("Completion relay error: {}", e));
            e.into_response()
        }
    }
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    match health_snapshot(&state.config) {
        Ok(health) => Json(health).into_response(),
        Err(e) => {
            state.logger.error("server", format!("Health check error: {}", e));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "error": "Internal server error",
                    "message": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Assemble the health snapshot. Recomputed on every call; the key check is
/// presence-only and never touches the upstream.
pub fn health_snapshot(config: &WrapperConfig) -> crate::error::Result<HealthResponse> {
    Ok(HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: EndpointMap {
            chat: "/chat".to_string(),
            completion: "/completion".to_string(),
            health: "/health".to_string(),
        },
        configuration: HealthConfiguration {
            dify_base_url: config.effective_base_url(),
            api_key_configured: config.api_key_configured(),
            runtime: format!("rust {}", env!("CARGO_PKG_RUST_VERSION")),
            environment: config.environment_label(),
        },
    })
}

async fn handle_index(headers: HeaderMap) -> Json<serde_json::Value> {
    let base_url = request_base_url(&headers);

    Json(serde_json::json!({
        "name": "Dify API Wrapper",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "A wrapper API for Dify chatbot services",
        "documentation": {
            "endpoints": {
                "chat": {
                    "url": format!("{}/chat", base_url),
                    "method": "POST",
                    "description": "Send chat messages to Dify chatbot",
                    "parameters": {
                        "message": "string (required) - The message to send",
                        "conversation_id": "string (optional) - Conversation ID for context",
                        "user_id": "string (optional) - User identifier (default: \"default-user\")",
                    },
                    "example": {
                        "request": {
                            "message": "Hello, how are you?",
                            "conversation_id": "1c7e55fb-1ba2-4e10-81b5-30addcea2276",
                            "user_id": "user123",
                        },
                        "response": {
                            "success": true,
                            "data": {
                                "message": "Hello! I'm doing well, thank you for asking.",
                                "conversation_id": "1c7e55fb-1ba2-4e10-81b5-30addcea2276",
                                "message_id": "msg-abc123",
                                "created_at": 1_704_067_200u64,
                                "metadata": { "model": "gpt-3.5-turbo", "tokens": 25 },
                            },
                        },
                    },
                },
                "completion": {
                    "url": format!("{}/completion", base_url),
                    "method": "POST",
                    "description": "Generate text completions using Dify",
                    "parameters": {
                        "inputs": "object (required) - Input variables for the completion",
                        "user_id": "string (optional) - User identifier (default: \"default-user\")",
                        "response_mode": "string (optional) - \"blocking\" or \"streaming\" (default: \"blocking\")",
                    },
                },
                "health": {
                    "url": format!("{}/health", base_url),
                    "method": "GET",
                    "description": "Check API health and configuration status",
                },
            },
        },
        "links": {
            "dify_docs": "https://docs.dify.ai/guides/application-publishing/developing-with-apis",
        },
    }))
}

async fn handle_chat_docs(headers: HeaderMap) -> Json<serde_json::Value> {
    let base_url = request_base_url(&headers);

    Json(serde_json::json!({
        "endpoint": "/chat",
        "method": "POST",
        "description": "Send chat messages to Dify chatbot",
        "documentation": base_url,
        "parameters": {
            "message": "string (required) - The message to send",
            "conversation_id": "string (optional) - Conversation ID for context",
            "user_id": "string (optional) - User identifier (default: \"default-user\")",
        },
        "example_request": {
            "method": "POST",
            "headers": { "Content-Type": "application/json" },
            "body": {
                "message": "Hello, how are you?",
                "conversation_id": "1c7e55fb-1ba2-4e10-81b5-30addcea2276",
                "user_id": "user123",
            },
        },
    }))
}

fn request_base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("https://{}", host)
}

async fn chat_post_only() -> Response {
    WrapperError::method_not_allowed(
        "This endpoint only accepts POST requests for chat functionality. \
         Use GET for documentation.",
    )
    .into_response()
}

async fn completion_post_only() -> Response {
    WrapperError::method_not_allowed("This endpoint only accepts POST requests").into_response()
}

async fn get_only() -> Response {
    WrapperError::method_not_allowed("This endpoint only accepts GET requests").into_response()
}

async fn handle_not_found(uri: Uri) -> Response {
    let body: ApiResponse<()> = ApiResponse::failure(
        crate::translate::api_types::ErrorBody::not_found(format!(
            "No such endpoint: {}",
            uri.path()
        )),
    );
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
