//! Wire types of the relay's JSON API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response of `GET /api/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// One conversation entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Response of the whitelist endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct WhitelistResponse {
    pub whitelist: Vec<String>,
}

/// Response of the workdir endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkDirResponse {
    #[serde(rename = "workDir")]
    pub work_dir: Option<String>,
}

/// One tracked client from `GET /api/admin/clients`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEntry {
    pub addr: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub requests: u64,
}

/// Response of `GET /api/admin/clients`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientsResponse {
    pub clients: Vec<ClientEntry>,
}

/// Relay counters from `GET /api/admin/metrics`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub requests_total: u64,
    pub requests_denied: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub events_parsed: u64,
    pub upstream_errors: u64,
}

/// Error body used by the relay and the bridge alike.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
