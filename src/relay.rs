//! The request-translation core: validate, build the Dify payload, issue
//! exactly one outbound call, reshape the result.
//!
//! Validation and configuration failures short-circuit before any network
//! I/O. Upstream failures are caught at the single call site and re-expressed
//! with the upstream status mirrored; nothing is retried.

use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::logging::SharedLogger;
use crate::translate::api_types::{ChatData, ChatRequest, CompletionData, CompletionRequest};
use crate::translate::dify_types::DifyMessage;
use crate::translate::request::{chat_payload, completion_payload};
use crate::translate::response::{chat_data, completion_data};

use serde::Serialize;

/// Relay a chat request to `POST {base_url}/v1/chat-messages`.
pub async fn relay_chat(
    req: &ChatRequest,
    config: &WrapperConfig,
    client: &reqwest::Client,
    logger: &SharedLogger,
) -> Result<ChatData> {
    let message = match req.message.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => return Err(WrapperError::bad_request("Message is required")),
    };

    let api_key = config.resolve_api_key()?;
    let payload = chat_payload(req, message);

    let msg = send_message(
        "chat-messages",
        &payload,
        &api_key,
        config,
        client,
        logger,
    )
    .await?;

    Ok(chat_data(&msg))
}

/// Relay a completion request to `POST {base_url}/v1/completion-messages`.
pub async fn relay_completion(
    req: &CompletionRequest,
    config: &WrapperConfig,
    client: &reqwest::Client,
    logger: &SharedLogger,
) -> Result<CompletionData> {
    let api_key = config.resolve_api_key()?;
    let payload = completion_payload(req);

    let msg = send_message(
        "completion-messages",
        &payload,
        &api_key,
        config,
        client,
        logger,
    )
    .await?;

    Ok(completion_data(&msg))
}

/// Issue the single outbound call and parse a blocking Dify message body.
async fn send_message<P: Serialize>(
    endpoint: &str,
    payload: &P,
    api_key: &str,
    config: &WrapperConfig,
    client: &reqwest::Client,
    logger: &SharedLogger,
) -> Result<DifyMessage> {
    let base_url = config.effective_base_url();
    let url = format!("{}/v1/{}", base_url.trim_end_matches('/'), endpoint);

    logger.info("relay", format!("POST {}", url));

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    logger.debug(
        "relay",
        format!("Response status={} body_len={}", status, body.len()),
    );

    if !status.is_success() {
        logger.error_with_context(
            "relay",
            "Dify API error",
            serde_json::json!({ "status": status.as_u16(), "body": truncate(&body, 500) }),
        );
        return Err(WrapperError::upstream(status.as_u16(), body));
    }

    let msg: DifyMessage = serde_json::from_str(&body)?;
    Ok(msg)
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
