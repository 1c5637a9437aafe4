//! One client-facing relay session over the upstream event stream.
//!
//! Raw bytes are mirrored to the client exactly as received; the same bytes
//! feed the frame reassembler for history projection. Parsing is synchronous
//! and O(chunk), so forwarding never waits on it. When the client
//! disconnects, axum drops the response body stream, which drops the
//! upstream response and cancels the in-flight request in the same turn.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::history::ConversationLog;
use crate::metrics::RelayMetrics;
use crate::relay::reassembler::FrameReassembler;
use crate::upstream::{BridgeTransport, UpstreamError};

/// Open a relay session and build the client-facing SSE response.
///
/// A connect failure produces a 200 event-stream response carrying one
/// synthetic `error` frame and then end-of-stream, so browser EventSource
/// clients receive it as a normal event.
pub async fn open(
    transport: Arc<dyn BridgeTransport>,
    history: Arc<ConversationLog>,
    metrics: Arc<RelayMetrics>,
) -> Response {
    let session = Uuid::new_v4();

    let upstream = match transport.events().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(%session, error = %e, "upstream connect failed; emitting synthetic error frame");
            metrics.record_upstream_error();
            return sse_response(Body::from(synthetic_error_frame(&e)));
        }
    };

    info!(%session, "relay session opened");
    metrics.record_session_opened();

    let mut reassembler = FrameReassembler::new();
    let guard = SessionGuard {
        session,
        metrics: Arc::clone(&metrics),
    };
    let stream = upstream.map(move |item| {
        let _ = &guard;
        match item {
            Ok(chunk) => {
                for event in reassembler.push(&chunk) {
                    metrics.record_event_parsed();
                    history.project(&event);
                }
                Ok(chunk)
            }
            Err(e) => {
                // Mid-stream failure terminates the session; the client sees
                // the stream end.
                warn!(%session, error = %e, "upstream stream error");
                metrics.record_upstream_error();
                Err(e)
            }
        }
    });

    sse_response(Body::from_stream(stream))
}

/// Records session close when the body stream is dropped, whether the stream
/// ended or the client disconnected first.
struct SessionGuard {
    session: Uuid,
    metrics: Arc<RelayMetrics>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        debug!(session = %self.session, "relay session closed");
        self.metrics.record_session_closed();
    }
}

fn sse_response(body: Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        // Disable proxy buffering so chunks reach the browser as they arrive.
        .header("X-Accel-Buffering", "no")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn synthetic_error_frame(e: &UpstreamError) -> String {
    let payload = serde_json::json!({ "error": e.to_string() });
    format!("event: error\ndata: {payload}\n\n")
}
