use super::api_types::{ChatData, CompletionData, Metadata};
use super::dify_types::{DifyMessage, DifyMetadata};

/// Model label reported when Dify omits usage metadata.
const UNKNOWN_MODEL: &str = "unknown";

/// Reshape a Dify chat message into the simplified chat response.
/// Pure function: `answer` becomes `message`, identifiers pass through.
pub fn chat_data(msg: &DifyMessage) -> ChatData {
    ChatData {
        message: msg.answer.clone(),
        conversation_id: msg.conversation_id.clone().unwrap_or_default(),
        message_id: msg.message_id.clone(),
        created_at: msg.created_at,
        metadata: project_metadata(msg.metadata.as_ref()),
    }
}

/// Reshape a Dify completion message. Completions are stateless, so the
/// simplified output carries no conversation identifier.
pub fn completion_data(msg: &DifyMessage) -> CompletionData {
    CompletionData {
        message: msg.answer.clone(),
        message_id: msg.message_id.clone(),
        created_at: msg.created_at,
        metadata: project_metadata(msg.metadata.as_ref()),
    }
}

/// Project Dify's nested usage block onto the flat `{model, tokens}` shape,
/// defaulting when any level of nesting is absent.
pub fn project_metadata(metadata: Option<&DifyMetadata>) -> Metadata {
    let usage = metadata.and_then(|m| m.usage.as_ref());
    Metadata {
        model: usage
            .and_then(|u| u.model.clone())
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
        tokens: usage.and_then(|u| u.total_tokens).unwrap_or(0),
    }
}
