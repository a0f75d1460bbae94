//! Error types for the wrapper.
//!
//! Every variant maps onto one wire-level error envelope; handlers return
//! `WrapperError` and axum serializes it via `IntoResponse`.

use crate::translate::api_types::{ApiResponse, ErrorBody};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WrapperError {
    #[error("Method not allowed: {message}")]
    MethodNotAllowed { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Dify API error: status {status}")]
    Upstream { status: u16, details: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl WrapperError {
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn upstream(status: u16, details: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            details: details.into(),
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Status code the caller sees. Upstream failures mirror the upstream
    /// status; everything unexpected collapses to 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The wire-level error envelope body for this error.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            Self::MethodNotAllowed { message } => ErrorBody::method_not_allowed(message),
            Self::BadRequest { message } => ErrorBody::bad_request(message),
            Self::Config { message } => ErrorBody::configuration(message),
            Self::Upstream { status, details } => ErrorBody::upstream(*status, details),
            other => ErrorBody::internal(other.to_string()),
        }
    }
}

impl IntoResponse for WrapperError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse::failure(self.to_body());
        (self.status_code(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WrapperError>;
