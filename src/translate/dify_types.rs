use super::api_types::ResponseMode;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Payloads (what we send TO Dify)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPayload {
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub query: String,
    pub response_mode: ResponseMode,
    pub user: String,
    // Included only when the caller supplied one; never sent as null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub response_mode: ResponseMode,
    pub user: String,
}

// ---------------------------------------------------------------------------
// Responses (what Dify sends BACK)
// ---------------------------------------------------------------------------

/// Body of a successful blocking chat or completion message. Completions
/// carry no `conversation_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifyMessage {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub message_id: String,
    pub created_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DifyMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifyMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<DifyUsage>,
    // Dify attaches retriever resources and other fields we don't project.
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifyUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}
