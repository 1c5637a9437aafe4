//! Relay service: shared-state assembly, router, and HTTP handlers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::access::{AccessPolicy, AllowListStore};
use crate::domain::config::RelayConfig;
use crate::domain::error::{ErrorBody, RelayError, StoreError};
use crate::domain::history::ConversationLog;
use crate::metrics::RelayMetrics;
use crate::middleware::{AdmissionLayer, ClientTable, ClientTrackerLayer};
use crate::relay::session;
use crate::upstream::{BridgeClient, BridgeTransport, ProxyReply, UpstreamError};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn BridgeTransport>,
    pub history: Arc<ConversationLog>,
    pub store: Arc<AllowListStore>,
    pub clients: Arc<ClientTable>,
    pub metrics: Arc<RelayMetrics>,
}

/// The relay service. Owns configuration and shared state; serves the
/// client and admin API on one listener.
pub struct RelayService {
    config: RelayConfig,
    state: AppState,
    policy: Arc<AccessPolicy>,
    shutdown_tx: watch::Sender<bool>,
}

impl RelayService {
    /// Create a service talking to the configured upstream bridge.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let transport = BridgeClient::new(
            config.upstream.base_url.clone(),
            Duration::from_secs(config.upstream.connect_timeout_secs),
        )
        .map_err(|e| {
            RelayError::Config(crate::domain::error::ConfigError::Invalid(e.to_string()))
        })?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a service with an explicit transport. Tests inject scripted
    /// bridges through this.
    pub fn with_transport(
        config: RelayConfig,
        transport: Arc<dyn BridgeTransport>,
    ) -> Result<Self, RelayError> {
        config.validate()?;

        let store = Arc::new(AllowListStore::load(&config.persistence.settings_path));
        let policy = Arc::new(AccessPolicy::new(
            config.access.static_whitelist.clone(),
            Arc::clone(&store),
        ));

        let state = AppState {
            transport,
            history: Arc::new(ConversationLog::new()),
            store,
            clients: Arc::new(ClientTable::new()),
            metrics: Arc::new(RelayMetrics::new()),
        };

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            state,
            policy,
            shutdown_tx,
        })
    }

    pub fn history(&self) -> Arc<ConversationLog> {
        Arc::clone(&self.state.history)
    }

    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Build the full router with middleware applied.
    ///
    /// Admission control guards the mutating endpoints only; reads stay
    /// open. The client tracker observes all `/api` traffic, including
    /// requests that admission goes on to deny.
    pub fn router(&self) -> Router {
        let guarded = Router::new()
            .route("/api/command", post(submit_command))
            .route("/api/respond", post(submit_response))
            .route("/api/reset", post(reset_session))
            .route("/api/admin/whitelist/add", post(whitelist_add))
            .route("/api/admin/whitelist/remove", post(whitelist_remove))
            .route("/api/admin/workdir", post(set_work_dir))
            .layer(AdmissionLayer::new(
                Arc::clone(&self.policy),
                Arc::clone(&self.state.metrics),
            ));

        let open = Router::new()
            .route("/api/events", get(relay_events))
            .route("/api/status", get(bridge_status))
            .route("/api/history", get(read_history))
            .route("/api/admin/whitelist", get(whitelist_list))
            .route("/api/admin/workdir", get(get_work_dir))
            .route("/api/admin/clients", get(list_clients))
            .route("/api/admin/metrics", get(read_metrics));

        Router::new()
            .merge(guarded)
            .merge(open)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    )
                    .layer(ClientTrackerLayer::new(
                        Arc::clone(&self.state.clients),
                        Arc::clone(&self.state.metrics),
                    )),
            )
            .with_state(self.state.clone())
    }

    /// Handle that triggers graceful shutdown when sent `true`.
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Bind and serve until shutdown is requested or the server fails.
    pub async fn start(&self) -> Result<(), RelayError> {
        let addr = self.config.server_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(RelayError::Bind)?;

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(addr = %addr, upstream = %self.config.upstream.base_url, "relay listening");

        let router = self.router();
        let serve = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        });

        if let Err(e) = serve.await {
            error!(error = %e, "server error");
        }

        info!("relay stopped");
        Ok(())
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// GET /api/events
async fn relay_events(State(state): State<AppState>) -> Response {
    session::open(
        Arc::clone(&state.transport),
        Arc::clone(&state.history),
        Arc::clone(&state.metrics),
    )
    .await
}

/// POST /api/command
async fn submit_command(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    submit_text(&state, &body, "command", "/command").await
}

/// POST /api/respond
async fn submit_response(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    submit_text(&state, &body, "response", "/respond").await
}

/// Shared path for the two submission endpoints. The user entry is recorded
/// only after the bridge accepts, so a busy or rejected submission leaves
/// history untouched.
async fn submit_text(
    state: &AppState,
    body: &serde_json::Value,
    field: &str,
    upstream_path: &str,
) -> Response {
    let text = body
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    if text.is_empty() {
        return validation_error(format!("{field} is required"));
    }

    let forward = serde_json::json!({ field: text });
    match state.transport.post_json(upstream_path, &forward).await {
        Ok(reply) => {
            if (200..300).contains(&reply.status) {
                state.history.record_user(text);
            }
            proxy_response(reply)
        }
        Err(e) => upstream_error_response(&state.metrics, e),
    }
}

/// GET /api/status
async fn bridge_status(State(state): State<AppState>) -> Response {
    match state.transport.status().await {
        Ok(reply) => proxy_response(reply),
        Err(e) => upstream_error_response(&state.metrics, e),
    }
}

/// GET /api/history
async fn read_history(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({ "history": state.history.entries() })).into_response()
}

/// POST /api/reset
///
/// History clears before the upstream call and stays cleared even if the
/// bridge cannot be reached; the caller still sees the upstream failure.
async fn reset_session(State(state): State<AppState>) -> Response {
    state.history.clear();
    match state
        .transport
        .post_json("/reset", &serde_json::json!({}))
        .await
    {
        Ok(reply) => proxy_response(reply),
        Err(e) => upstream_error_response(&state.metrics, e),
    }
}

/// GET /api/admin/whitelist
async fn whitelist_list(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({ "whitelist": state.store.snapshot() })).into_response()
}

/// POST /api/admin/whitelist/add
async fn whitelist_add(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    mutate_whitelist(&state, &body, |store, ip| store.add(ip))
}

/// POST /api/admin/whitelist/remove
async fn whitelist_remove(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    mutate_whitelist(&state, &body, |store, ip| store.remove(ip))
}

fn mutate_whitelist(
    state: &AppState,
    body: &serde_json::Value,
    op: impl Fn(&AllowListStore, &str) -> Result<Vec<String>, StoreError>,
) -> Response {
    let address = body.get("address").and_then(|v| v.as_str()).unwrap_or("");
    if address.trim().is_empty() {
        return validation_error("address is required");
    }

    match op(&state.store, address) {
        Ok(whitelist) => Json(serde_json::json!({ "whitelist": whitelist })).into_response(),
        Err(e) if e.is_validation() => validation_error(e.to_string()),
        Err(e) => {
            // The in-memory set already mutated and stays authoritative;
            // report the persistence failure alongside it.
            error!(error = %e, "allow-list persistence failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "whitelist": state.store.snapshot(),
                })),
            )
                .into_response()
        }
    }
}

/// GET /api/admin/workdir
async fn get_work_dir(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({ "workDir": state.store.work_dir() })).into_response()
}

/// POST /api/admin/workdir
async fn set_work_dir(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let dir = body.get("workDir").and_then(|v| v.as_str()).unwrap_or("");
    if dir.trim().is_empty() {
        return validation_error("workDir is required");
    }

    match state.store.set_work_dir(dir) {
        Ok(()) => Json(serde_json::json!({ "workDir": dir.trim() })).into_response(),
        Err(e) => {
            error!(error = %e, "workDir persistence failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "workDir": state.store.work_dir(),
                })),
            )
                .into_response()
        }
    }
}

/// GET /api/admin/clients
async fn list_clients(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({ "clients": state.clients.snapshot() })).into_response()
}

/// GET /api/admin/metrics
async fn read_metrics(State(state): State<AppState>) -> Response {
    Json(state.metrics.snapshot()).into_response()
}

fn proxy_response(reply: ProxyReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(reply.body)).into_response()
}

fn upstream_error_response(metrics: &RelayMetrics, e: UpstreamError) -> Response {
    metrics.record_upstream_error();
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody::upstream_unavailable(e)),
    )
        .into_response()
}

fn validation_error(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
}
