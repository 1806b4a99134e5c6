//! Request bodies accepted by the gateway and sent upstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ProxyError;
use crate::config::GenerationDefaults;

/// Body posted by the browser tool.
///
/// Fields are kept loose so validation can report the documented error kinds
/// instead of a generic deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyRequest {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    pub messages: Option<Value>,
    pub model: Option<String>,
    pub temperature: Option<Value>,
    pub max_tokens: Option<Value>,
    pub response_format: Option<Value>,
}

/// Body sent to the upstream chat-completion API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpstreamRequest {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: f64,
    pub max_tokens: u64,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

/// A validated request: the key to authorize with and the upstream body.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub api_key: String,
    pub upstream: UpstreamRequest,
}

impl ProxyRequest {
    /// Check required fields and fill defaults.
    pub fn validate(self, defaults: &GenerationDefaults) -> Result<ValidatedRequest, ProxyError> {
        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or(ProxyError::MissingApiKey)?;

        let messages = match self.messages {
            Some(Value::Array(messages)) if !messages.is_empty() => messages,
            _ => return Err(ProxyError::InvalidMessages),
        };

        let temperature = self
            .temperature
            .as_ref()
            .and_then(numeric)
            .unwrap_or(defaults.temperature);

        let max_tokens = self
            .max_tokens
            .as_ref()
            .and_then(numeric)
            .filter(|n| *n >= 0.0)
            .map(|n| n.trunc() as u64)
            .unwrap_or(u64::from(defaults.max_tokens));

        Ok(ValidatedRequest {
            api_key,
            upstream: UpstreamRequest {
                model: self
                    .model
                    .filter(|model| !model.is_empty())
                    .unwrap_or_else(|| defaults.model.clone()),
                messages,
                temperature,
                max_tokens,
                stream: false,
                response_format: self.response_format.filter(|v| !v.is_null()),
            },
        })
    }
}

/// Number or numeric string
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
