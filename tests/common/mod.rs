#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use quizgen::config::Config;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the fake upstream saw on its last call
#[derive(Clone, Default)]
pub struct Captured {
    inner: Arc<Mutex<Option<(Option<String>, Value)>>>,
}

impl Captured {
    pub fn authorization(&self) -> Option<String> {
        self.inner.lock().unwrap().as_ref().and_then(|(auth, _)| auth.clone())
    }

    pub fn body(&self) -> Option<Value> {
        self.inner.lock().unwrap().as_ref().map(|(_, body)| body.clone())
    }
}

/// Serve `app` on an ephemeral port and return its address
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Address nothing is listening on
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

/// Upstream that records the request and answers with `status` and `reply`
pub async fn spawn_upstream(status: StatusCode, reply: Value) -> (SocketAddr, Captured) {
    let captured = Captured::default();
    let sink = captured.clone();

    let app = Router::new().route(
        "/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let sink = sink.clone();
            let reply = reply.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                *sink.inner.lock().unwrap() = Some((auth, body));
                (status, Json(reply))
            }
        }),
    );

    (spawn(app).await, captured)
}

/// Upstream that never answers within `delay`
pub async fn spawn_slow_upstream(delay: Duration) -> SocketAddr {
    let app = Router::new().route(
        "/chat/completions",
        post(move || async move {
            tokio::time::sleep(delay).await;
            Json(completion_body("late"))
        }),
    );
    spawn(app).await
}

/// Upstream that answers 200 with a body that is not JSON
pub async fn spawn_text_upstream(body: &'static str) -> SocketAddr {
    let app = Router::new().route("/chat/completions", post(move || async move { body }));
    spawn(app).await
}

/// Upstream that sends an error status line, then stalls inside the body
pub async fn spawn_stalled_error_upstream(stall: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  content-type: application/json\r\n\
                  content-length: 64\r\n\r\n{\"error\":",
            )
            .await;
        tokio::time::sleep(stall).await;
    });
    addr
}

pub fn config_for(upstream: SocketAddr) -> Config {
    let mut config = Config::default();
    config.gateway.upstream_url = format!("http://{}/chat/completions", upstream);
    config.gateway.timeout_secs = 1;
    config
}
