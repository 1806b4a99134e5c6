use thiserror::Error;

/// Errors seen by callers of the gateway
#[derive(Error, Debug)]
pub enum LlmError {
    /// The gateway answered with its `{error, message}` object
    #[error("{error}: {message}")]
    Gateway {
        status: u16,
        error: String,
        message: String,
    },

    /// Non-success reply without a recognizable error object
    #[error("API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuildFailed(String),

    #[error("Request timeout")]
    Timeout,

    /// The gateway answered with a success status but no usable completion
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LlmError {
    /// HTTP status carried by the failure, if the gateway answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Gateway { status, .. } | LlmError::ApiError { status, .. } => Some(*status),
            LlmError::InvalidApiKey => Some(401),
            LlmError::RateLimitExceeded => Some(429),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
