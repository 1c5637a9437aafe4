//! Scripted upstream bridge for integration tests.
//!
//! Serves the same surface as the real bridge process: a long-lived SSE
//! endpoint plus small JSON endpoints. The frames served on `/events` and
//! the busy flag are scripted per test; every accepted POST is recorded so
//! tests can assert what the relay forwarded.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream;

#[derive(Default)]
pub struct BridgeState {
    /// Raw SSE text served verbatim to each `/events` client.
    frames: Vec<String>,
    /// `(path, body)` of every accepted POST, in order.
    posts: Mutex<Vec<(String, serde_json::Value)>>,
    /// When set, `/command` and `/respond` answer 409.
    busy: AtomicBool,
}

/// A running fake bridge on an ephemeral loopback port.
pub struct FakeBridge {
    addr: SocketAddr,
    state: Arc<BridgeState>,
}

impl FakeBridge {
    /// Start a bridge serving `frames` on `/events`.
    pub async fn start(frames: Vec<String>) -> Self {
        let state = Arc::new(BridgeState {
            frames,
            ..Default::default()
        });

        let app = Router::new()
            .route("/events", get(events))
            .route("/command", post(command))
            .route("/respond", post(respond))
            .route("/reset", post(reset))
            .route("/status", get(status))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake bridge");
        let addr = listener.local_addr().expect("fake bridge addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake bridge serve");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every `(path, body)` the bridge accepted, in order.
    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.state.posts.lock().expect("posts lock").clone()
    }

    /// Make `/command` and `/respond` answer 409 until cleared.
    pub fn set_busy(&self, busy: bool) {
        self.state.busy.store(busy, Ordering::SeqCst);
    }
}

async fn events(State(state): State<Arc<BridgeState>>) -> Response {
    let chunks: Vec<Result<Bytes, Infallible>> = state
        .frames
        .iter()
        .map(|frame| Ok(Bytes::from(frame.clone())))
        .collect();

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream::iter(chunks)),
    )
        .into_response()
}

async fn command(
    State(state): State<Arc<BridgeState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    accept_submission(&state, "/command", "command", body)
}

async fn respond(
    State(state): State<Arc<BridgeState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    accept_submission(&state, "/respond", "response", body)
}

fn accept_submission(
    state: &BridgeState,
    path: &str,
    field: &str,
    body: serde_json::Value,
) -> Response {
    if state.busy.load(Ordering::SeqCst) {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "agent is busy"})),
        )
            .into_response();
    }
    if body.get(field).and_then(|v| v.as_str()).unwrap_or("").is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("{field} is required")})),
        )
            .into_response();
    }

    state
        .posts
        .lock()
        .expect("posts lock")
        .push((path.to_string(), body));
    Json(serde_json::json!({"status": "sent"})).into_response()
}

async fn reset(
    State(state): State<Arc<BridgeState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state
        .posts
        .lock()
        .expect("posts lock")
        .push(("/reset".to_string(), body));
    Json(serde_json::json!({"status": "reset"})).into_response()
}

async fn status(State(state): State<Arc<BridgeState>>) -> Response {
    Json(serde_json::json!({
        "running": true,
        "busy": state.busy.load(Ordering::SeqCst),
    }))
    .into_response()
}
