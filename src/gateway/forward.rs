//! Single-shot forwarding of a validated request to the upstream provider.

use bytes::Bytes;
use reqwest::{header, Client};
use serde::de::IgnoredAny;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use super::error::ProxyError;
use super::models::UpstreamRequest;

/// Fallback message when the upstream error body cannot be read
const UPSTREAM_ERROR_FALLBACK: &str = "DeepSeek API error";

/// Forward a chat completion request to the upstream API.
///
/// Returns the upstream JSON body untouched on success. At most one
/// outbound call is made and it is bounded by `timeout`.
pub async fn forward_completion(
    client: &Client,
    upstream_url: &str,
    api_key: &str,
    request: &UpstreamRequest,
    timeout: Duration,
) -> Result<Bytes, ProxyError> {
    debug!(upstream = %upstream_url, model = %request.model, "Forwarding to upstream");

    let response = client
        .post(upstream_url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .bearer_auth(api_key)
        .timeout(timeout)
        .json(request)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    info!(status = status.as_u16(), "Upstream response status");

    if !status.is_success() {
        let error_text = match response.text().await {
            Ok(text) => text,
            Err(e) if e.is_timeout() => return Err(ProxyError::Timeout),
            Err(e) => {
                debug!("Could not read upstream error body: {}", e);
                UPSTREAM_ERROR_FALLBACK.to_string()
            }
        };
        error!(kind = "upstream", status = status.as_u16(), body = %error_text, "Upstream API error");

        return Err(ProxyError::Upstream {
            status,
            message: upstream_error_message(&error_text),
        });
    }

    let body = response.bytes().await.map_err(transport_error)?;

    serde_json::from_slice::<IgnoredAny>(&body)
        .map_err(|e| ProxyError::Unexpected(format!("Upstream returned invalid JSON: {}", e)))?;

    Ok(body)
}

/// Classify a reqwest failure into the gateway taxonomy
fn transport_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::Timeout
    } else if err.is_connect() || err.is_request() {
        ProxyError::Connectivity(err.to_string())
    } else {
        ProxyError::Unexpected(err.to_string())
    }
}

/// Best-effort message from an upstream error body.
///
/// Prefers `error.message`, then `error` itself, then the raw text.
pub fn upstream_error_message(text: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };

    match json.get("error") {
        Some(Value::Object(obj)) => match obj.get("message") {
            Some(Value::String(msg)) if !msg.is_empty() => msg.clone(),
            _ => Value::Object(obj.clone()).to_string(),
        },
        Some(Value::String(msg)) if !msg.is_empty() => msg.clone(),
        Some(Value::Null) | Some(Value::Bool(false)) | None => text.to_string(),
        Some(Value::String(_)) => text.to_string(),
        Some(other) => other.to_string(),
    }
}
