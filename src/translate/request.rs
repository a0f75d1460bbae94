use super::api_types::{ChatRequest, CompletionRequest, ResponseMode, DEFAULT_USER_ID};
use super::dify_types::{ChatPayload, CompletionPayload};

/// Build the Dify chat payload from a validated inbound request.
/// Pure function: `message` must already have passed the non-empty check.
pub fn chat_payload(req: &ChatRequest, message: &str) -> ChatPayload {
    ChatPayload {
        inputs: serde_json::Map::new(),
        query: message.to_string(),
        response_mode: ResponseMode::Blocking,
        user: effective_user(req.user_id.as_deref()),
        conversation_id: req
            .conversation_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
    }
}

/// Build the Dify completion payload. Inputs and response mode pass through,
/// defaults already applied at parse time.
pub fn completion_payload(req: &CompletionRequest) -> CompletionPayload {
    CompletionPayload {
        inputs: req.inputs.clone(),
        response_mode: req.response_mode,
        user: effective_user(req.user_id.as_deref()),
    }
}

// The default fires only when the field is absent; an explicit empty string
// is forwarded verbatim.
fn effective_user(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) => id.to_string(),
        None => DEFAULT_USER_ID.to_string(),
    }
}
