use thiserror::Error;

/// Main application error type that aggregates domain-specific errors
#[derive(Error, Debug)]
pub enum QuizError {
    /// Configuration layer errors
    #[error(transparent)]
    Config(#[from] crate::config::error::ConfigError),

    /// Gateway client errors
    #[error(transparent)]
    Llm(#[from] crate::llm::error::LlmError),

    /// Model output could not be turned into questions
    #[error(transparent)]
    Extract(#[from] crate::quiz::error::ExtractError),

    /// Caller input rejected before any network call
    #[error("{0}")]
    Validation(String),
}

/// Result type alias for quizgen operations
pub type Result<T> = std::result::Result<T, QuizError>;

impl QuizError {
    pub fn validation(msg: impl Into<String>) -> Self {
        QuizError::Validation(msg.into())
    }

    /// Short tag used when logging the error
    pub fn kind(&self) -> &'static str {
        use crate::llm::error::LlmError;

        match self {
            QuizError::Config(_) => "config",
            QuizError::Llm(LlmError::Timeout) => "timeout",
            QuizError::Llm(LlmError::Network(_)) => "connectivity",
            QuizError::Llm(LlmError::InvalidApiKey) => "auth",
            QuizError::Llm(LlmError::RateLimitExceeded) => "rate_limit",
            QuizError::Llm(LlmError::Gateway { .. } | LlmError::ApiError { .. }) => "upstream",
            QuizError::Llm(_) => "llm",
            QuizError::Extract(_) => "parse",
            QuizError::Validation(_) => "validation",
        }
    }

    /// Vietnamese message shown to the person running the command
    pub fn user_message(&self) -> String {
        use crate::llm::error::LlmError;

        match self {
            QuizError::Llm(LlmError::Timeout) => {
                "Request timeout - Vui lòng thử lại với ít câu hỏi hơn".to_string()
            }
            QuizError::Llm(LlmError::InvalidApiKey) => {
                "API Key không hợp lệ. Vui lòng kiểm tra lại DeepSeek API Key".to_string()
            }
            QuizError::Llm(LlmError::RateLimitExceeded) => {
                "Quá nhiều request. Vui lòng thử lại sau vài phút".to_string()
            }
            QuizError::Llm(LlmError::Gateway { error, .. }) => format!("DeepSeek API: {}", error),
            QuizError::Llm(LlmError::Network(_)) => {
                "Lỗi kết nối mạng. Vui lòng kiểm tra internet và thử lại".to_string()
            }
            QuizError::Validation(msg) => msg.clone(),
            other => format!("Lỗi tạo đề: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::error::LlmError;

    #[test]
    fn test_kind_tags() {
        assert_eq!(QuizError::validation("empty key").kind(), "validation");
        assert_eq!(QuizError::from(LlmError::Timeout).kind(), "timeout");
        assert_eq!(QuizError::from(LlmError::InvalidApiKey).kind(), "auth");
        assert_eq!(
            QuizError::from(LlmError::ApiError {
                status: 500,
                message: "boom".into()
            })
            .kind(),
            "upstream"
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            QuizError::from(LlmError::InvalidApiKey).user_message(),
            "API Key không hợp lệ. Vui lòng kiểm tra lại DeepSeek API Key"
        );
        assert!(QuizError::from(LlmError::Timeout)
            .user_message()
            .starts_with("Request timeout - "));
        assert!(QuizError::from(LlmError::RateLimitExceeded)
            .user_message()
            .starts_with("Quá nhiều request"));
        assert_eq!(
            QuizError::from(LlmError::Gateway {
                status: 502,
                error: "Bad Gateway".into(),
                message: "Cannot connect".into(),
            })
            .user_message(),
            "DeepSeek API: Bad Gateway"
        );
        assert_eq!(
            QuizError::validation("Vui lòng nhập API Key!").user_message(),
            "Vui lòng nhập API Key!"
        );
        assert_eq!(
            QuizError::from(LlmError::InvalidResponse("no choices".into())).user_message(),
            "Lỗi tạo đề: Invalid response format: no choices"
        );
    }

    #[test]
    fn test_transparent_display() {
        let err = QuizError::from(LlmError::Gateway {
            status: 400,
            error: "Missing API Key".into(),
            message: "API Key is required".into(),
        });
        assert_eq!(err.to_string(), "Missing API Key: API Key is required");
    }
}
