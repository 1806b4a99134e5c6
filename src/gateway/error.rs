//! Error taxonomy of the gateway and its HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::llm::ErrorBody;

/// Every way a gateway call can fail
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("API Key is required")]
    MissingApiKey,

    #[error("Messages must be a non-empty array")]
    InvalidMessages,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Only POST requests are accepted")]
    MethodNotAllowed,

    /// Provider answered with a non-success status
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Request to DeepSeek API timed out. Please try again.")]
    Timeout,

    /// Transport failure; the detail is logged, not returned
    #[error("Cannot connect to DeepSeek API. Please check your network.")]
    Connectivity(String),

    #[error("{0}")]
    Unexpected(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingApiKey | ProxyError::InvalidMessages | ProxyError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Connectivity(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Value of the `error` field in the response body
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingApiKey => "Missing API Key",
            ProxyError::InvalidMessages => "Invalid messages",
            ProxyError::InvalidBody(_) => "Invalid request body",
            ProxyError::MethodNotAllowed => "Method not allowed",
            ProxyError::Upstream { .. } => "DeepSeek API Error",
            ProxyError::Timeout => "Gateway Timeout",
            ProxyError::Connectivity(_) => "Bad Gateway",
            ProxyError::Unexpected(_) => "Internal Server Error",
        }
    }

    /// Short tag used in logs
    pub fn log_kind(&self) -> &'static str {
        match self {
            ProxyError::MissingApiKey
            | ProxyError::InvalidMessages
            | ProxyError::InvalidBody(_)
            | ProxyError::MethodNotAllowed => "validation",
            ProxyError::Upstream { .. } => "upstream",
            ProxyError::Timeout => "timeout",
            ProxyError::Connectivity(_) => "connectivity",
            ProxyError::Unexpected(_) => "unknown",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            ProxyError::Unexpected(msg) if msg.is_empty() => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        ErrorBody {
            error: self.kind().to_string(),
            message,
            status: match self {
                ProxyError::Upstream { status, .. } => Some(status.as_u16()),
                _ => None,
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
