use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use super::error::{LlmError, Result};
use super::types::{CompletionResponse, ErrorBody, GenerationRequest};
use crate::config::ClientConfig;

/// Anything that can run one generation call through the gateway
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<CompletionResponse>;
}

/// Body posted to the gateway: the generation request plus the caller's key
#[derive(Serialize)]
struct GatewayPayload<'a> {
    #[serde(rename = "apiKey")]
    api_key: &'a str,
    #[serde(flatten)]
    request: &'a GenerationRequest,
}

/// HTTP client for the forwarding gateway
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    url: String,
}

impl GatewayClient {
    /// Create a new gateway client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::ClientBuildFailed(e.to_string()))?;

        Ok(Self {
            client,
            url: config.gateway_url.clone(),
        })
    }
}

#[async_trait]
impl CompletionGateway for GatewayClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<CompletionResponse> {
        debug!(
            url = %self.url,
            model = %request.model,
            messages = request.messages.len(),
            timeout_secs = timeout.as_secs(),
            "Sending request to gateway"
        );

        let response = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .json(&GatewayPayload { api_key, request })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "Gateway replied");

        if !status.is_success() {
            let err = reply_error(status, &body);
            error!(kind = "gateway", status = status.as_u16(), "{}", err);
            return Err(err);
        }

        let completion: CompletionResponse = serde_json::from_slice(&body)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if completion.choices.is_empty() {
            return Err(LlmError::InvalidResponse(
                "response contains no choices".to_string(),
            ));
        }

        Ok(completion)
    }
}

fn transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Network(err)
    }
}

/// Translate a non-success gateway reply into a typed error
fn reply_error(status: StatusCode, body: &[u8]) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED => LlmError::InvalidApiKey,
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        _ => match serde_json::from_slice::<ErrorBody>(body) {
            Ok(ErrorBody { error, message, .. }) => LlmError::Gateway {
                status: status.as_u16(),
                error,
                message,
            },
            Err(_) => LlmError::ApiError {
                status: status.as_u16(),
                message: String::from_utf8_lossy(body).into_owned(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    #[test]
    fn test_client_creation() {
        let client = GatewayClient::new(&ClientConfig::default()).unwrap();
        assert_eq!(client.url, "http://127.0.0.1:3000/api/deepseek-proxy");
    }

    #[test]
    fn test_payload_shape() {
        let request = GenerationRequest {
            messages: vec![Message::user("Hello")],
            model: "deepseek-chat".to_string(),
            temperature: 0.1,
            max_tokens: 10,
            response_format: None,
        };

        let payload = serde_json::to_value(GatewayPayload {
            api_key: "sk-test",
            request: &request,
        })
        .unwrap();

        assert_eq!(payload["apiKey"], "sk-test");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["max_tokens"], 10);
        assert!(payload.get("response_format").is_none());
    }

    #[test]
    fn test_reply_error_mapping() {
        assert!(matches!(
            reply_error(StatusCode::UNAUTHORIZED, b"{}"),
            LlmError::InvalidApiKey
        ));
        assert!(matches!(
            reply_error(StatusCode::TOO_MANY_REQUESTS, b""),
            LlmError::RateLimitExceeded
        ));

        let err = reply_error(
            StatusCode::GATEWAY_TIMEOUT,
            br#"{"error":"Gateway Timeout","message":"timed out"}"#,
        );
        match err {
            LlmError::Gateway { status, error, .. } => {
                assert_eq!(status, 504);
                assert_eq!(error, "Gateway Timeout");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = reply_error(StatusCode::BAD_GATEWAY, b"<html>bad</html>");
        assert!(matches!(err, LlmError::ApiError { status: 502, .. }));
    }
}
