//! Axum HTTP server for the forwarding gateway.
//!
//! One handler serves every path: OPTIONS answers the pre-flight, POST
//! forwards to the upstream provider, everything else is rejected.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::error::ProxyError;
use super::forward::forward_completion;
use super::models::ProxyRequest;
use crate::config::{Config, GenerationDefaults};
use crate::core::metrics::Timer;
use crate::core::Result;
use crate::llm::LlmError;

/// Cross-origin headers attached to every response
const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-credentials", "true"),
    ("access-control-allow-origin", "*"),
    (
        "access-control-allow-methods",
        "GET,OPTIONS,PATCH,DELETE,POST,PUT",
    ),
    (
        "access-control-allow-headers",
        "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version",
    ),
];

/// Shared state for the gateway handler.
#[derive(Clone)]
pub struct GatewayState {
    /// HTTP client for upstream requests.
    client: Client,
    upstream_url: Arc<str>,
    timeout: Duration,
    defaults: Arc<GenerationDefaults>,
}

impl GatewayState {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmError::ClientBuildFailed(e.to_string()))?;

        Ok(Self {
            client,
            upstream_url: Arc::from(config.gateway.upstream_url.as_str()),
            timeout: config.gateway.timeout(),
            defaults: Arc::new(config.defaults.clone()),
        })
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    let mut app = Router::new()
        .fallback(handle)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    for (name, value) in CORS_HEADERS {
        app = app.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(*name),
            HeaderValue::from_static(*value),
        ));
    }

    app
}

/// Run the gateway on a pre-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(upstream = %state.upstream_url, "Gateway listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Gateway shut down");
    Ok(())
}

async fn handle(State(state): State<GatewayState>, method: Method, body: Bytes) -> Response {
    match method {
        Method::OPTIONS => StatusCode::OK.into_response(),
        Method::POST => match proxy(&state, &body).await {
            Ok(upstream_body) => {
                info!("Request successful");
                Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(upstream_body))
                    .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
            }
            Err(e) => {
                error!(kind = e.log_kind(), status = e.status().as_u16(), detail = ?e, "Gateway request failed");
                e.into_response()
            }
        },
        other => {
            info!(method = %other, "Rejected method");
            ProxyError::MethodNotAllowed.into_response()
        }
    }
}

async fn proxy(state: &GatewayState, body: &[u8]) -> std::result::Result<Bytes, ProxyError> {
    info!("Received completion request");
    let timer = Timer::start("gateway.forward");

    let request: ProxyRequest =
        serde_json::from_slice(body).map_err(|e| ProxyError::InvalidBody(e.to_string()))?;
    let validated = request.validate(&state.defaults)?;

    let result = forward_completion(
        &state.client,
        &state.upstream_url,
        &validated.api_key,
        &validated.upstream,
        state.timeout,
    )
    .await;

    timer.stop();
    result
}
