//! Caller-facing helpers: quiz generation, theory summaries, key probe.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::extract::parse_questions;
use super::prompt::{build_quiz_prompt, build_theory_prompt};
use super::types::{QuestionRecord, QuizConfig};
use crate::config::{Config, GenerationDefaults};
use crate::core::metrics::Timer;
use crate::core::{QuizError, Result};
use crate::llm::{
    CompletionGateway, CompletionResponse, GatewayClient, GenerationRequest, LlmError, Message,
    ResponseFormat,
};

const THEORY_TEMPERATURE: f64 = 0.2;
const THEORY_MAX_TOKENS: u32 = 2000;
const PROBE_TEMPERATURE: f64 = 0.1;
const PROBE_MAX_TOKENS: u32 = 10;

/// Prefix of the text returned when a theory summary cannot be produced
pub const THEORY_PLACEHOLDER: &str = "Không thể tải lý thuyết lúc này: ";

/// Wait bounds for each kind of call
#[derive(Debug, Clone, Copy)]
pub struct ServiceTimeouts {
    pub quiz: Duration,
    pub theory: Duration,
    pub probe: Duration,
}

/// Runs the quiz helpers against a gateway
#[derive(Clone)]
pub struct QuizService {
    gateway: Arc<dyn CompletionGateway>,
    defaults: GenerationDefaults,
    timeouts: ServiceTimeouts,
}

impl QuizService {
    pub fn new(gateway: Arc<dyn CompletionGateway>, config: &Config) -> Self {
        Self {
            gateway,
            defaults: config.defaults.clone(),
            timeouts: ServiceTimeouts {
                quiz: config.client.quiz_timeout(),
                theory: config.client.theory_timeout(),
                probe: config.client.probe_timeout(),
            },
        }
    }

    /// Service backed by an HTTP client for the configured gateway
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GatewayClient::new(&config.client)?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Generate a quiz and return the questions the model produced.
    ///
    /// The number of questions is not enforced; a mismatch is only logged.
    pub async fn generate_quiz(
        &self,
        config: &QuizConfig,
        api_key: &str,
    ) -> Result<Vec<QuestionRecord>> {
        require_api_key(api_key)?;

        let total = match config.distribution.total() {
            Some(0) => {
                return Err(log_failure(QuizError::validation(
                    "Vui lòng chọn ít nhất một câu hỏi",
                )))
            }
            Some(total) => total,
            None => {
                return Err(log_failure(QuizError::validation(
                    "Số lượng câu hỏi yêu cầu quá lớn",
                )))
            }
        };

        info!(topic = %config.topic, total, "Generating quiz");
        let timer = Timer::start("quiz.generate");

        let prompt = build_quiz_prompt(config);
        let request = GenerationRequest {
            messages: vec![Message::system(prompt.system), Message::user(prompt.user)],
            model: self.defaults.model.clone(),
            temperature: self.defaults.temperature,
            max_tokens: self.defaults.max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        };

        let content = self
            .complete(api_key, &request, self.timeouts.quiz)
            .await
            .map_err(|e| log_failure(QuizError::from(e)))?;

        let questions = parse_questions(&content, total as usize)
            .map_err(|e| log_failure(QuizError::from(e)))?;

        timer.stop();
        info!(count = questions.len(), "Quiz generated");
        Ok(questions)
    }

    /// Generate a Markdown theory summary for a topic.
    ///
    /// Authentication and gateway-reported failures are returned as errors;
    /// any other failure yields a readable placeholder text instead.
    pub async fn generate_theory(&self, topic: &str, api_key: &str) -> Result<String> {
        require_api_key(api_key)?;

        info!(topic, "Generating theory");
        let request = GenerationRequest {
            messages: vec![Message::user(build_theory_prompt(topic))],
            model: self.defaults.model.clone(),
            temperature: THEORY_TEMPERATURE,
            max_tokens: THEORY_MAX_TOKENS,
            response_format: None,
        };

        match self.complete(api_key, &request, self.timeouts.theory).await {
            Ok(text) => Ok(text),
            Err(
                e @ (LlmError::InvalidApiKey
                | LlmError::RateLimitExceeded
                | LlmError::Gateway { .. }),
            ) => Err(log_failure(QuizError::from(e))),
            Err(e) => {
                let err = QuizError::from(e);
                warn!(kind = err.kind(), "Theory generation failed: {}", err);
                Ok(format!("{}{}", THEORY_PLACEHOLDER, err))
            }
        }
    }

    /// Check whether the gateway accepts a key with a minimal request.
    ///
    /// Any success status counts, even when the completion itself is
    /// unusable.
    pub async fn test_api_key(&self, api_key: &str) -> bool {
        if api_key.trim().is_empty() {
            return false;
        }

        let request = GenerationRequest {
            messages: vec![Message::user("Hello")],
            model: self.defaults.model.clone(),
            temperature: PROBE_TEMPERATURE,
            max_tokens: PROBE_MAX_TOKENS,
            response_format: None,
        };

        match self
            .gateway
            .complete(api_key, &request, self.timeouts.probe)
            .await
        {
            Ok(_) => true,
            // Only raised once the gateway has answered with a success status
            Err(LlmError::InvalidResponse(reason)) => {
                info!(%reason, "API key accepted, completion unusable");
                true
            }
            Err(e) => {
                warn!(kind = QuizError::from(e).kind(), "API key test failed");
                false
            }
        }
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> std::result::Result<String, LlmError> {
        let response: CompletionResponse =
            self.gateway.complete(api_key, request, timeout).await?;
        response
            .first_content()
            .map(str::to_owned)
            .ok_or_else(|| LlmError::InvalidResponse("response contains no choices".to_string()))
    }
}

fn require_api_key(api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        let err = QuizError::validation("Vui lòng nhập API Key!");
        error!(kind = err.kind(), "{}", err);
        return Err(err);
    }
    Ok(())
}

fn log_failure(err: QuizError) -> QuizError {
    error!(kind = err.kind(), "{}", err);
    err
}
