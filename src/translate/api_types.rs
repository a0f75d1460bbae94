use serde::{Deserialize, Serialize};

/// User identity sent upstream when the caller does not supply one.
pub const DEFAULT_USER_ID: &str = "default-user";

// ---------------------------------------------------------------------------
// Request types (what callers send TO us)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Required; validated before any upstream call is made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub response_mode: ResponseMode,
}

/// Dify's response delivery mode. The wrapper forwards this verbatim but only
/// shapes blocking (single JSON body) responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Blocking,
    Streaming,
}

// ---------------------------------------------------------------------------
// Response envelope (what we send BACK to callers)
// ---------------------------------------------------------------------------

/// The wrapper's wire envelope. Internally an explicit sum type; on the wire
/// the success variant is `{"success": true, "data": ...}` and the failure
/// variant is `{"error": ..., "message": ..., "details"?: ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Success(SuccessBody<T>),
    Failure(ErrorBody),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::Success(SuccessBody {
            success: true,
            data,
        })
    }

    pub fn failure(body: ErrorBody) -> Self {
        Self::Failure(body)
    }
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new("Method not allowed", msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new("Bad request", msg)
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new("Server configuration error", msg)
    }

    pub fn upstream(status: u16, details: impl Into<String>) -> Self {
        Self::new(
            "Dify API error",
            format!("Request failed with status {}", status),
        )
        .with_details(details)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new("Internal server error", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new("Not found", msg)
    }
}

// ---------------------------------------------------------------------------
// Simplified response data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatData {
    pub message: String,
    pub conversation_id: String,
    pub message_id: String,
    pub created_at: u64,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionData {
    pub message: String,
    pub message_id: String,
    pub created_at: u64,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub model: String,
    pub tokens: u64,
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: String,
    pub version: String,
    pub endpoints: EndpointMap,
    pub configuration: HealthConfiguration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointMap {
    pub chat: String,
    pub completion: String,
    pub health: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfiguration {
    pub dify_base_url: String,
    pub api_key_configured: bool,
    pub runtime: String,
    pub environment: String,
}
