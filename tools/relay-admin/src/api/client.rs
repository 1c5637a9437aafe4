//! HTTP client for the relay's admin API.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use super::types::*;

/// Errors talking to the relay.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Relay error ({status}): {message}")]
    Relay { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Admin API client.
pub struct RelayApiClient {
    client: Client,
    base_url: String,
}

impl RelayApiClient {
    /// Create a client for a relay at `base_url`, e.g. `http://127.0.0.1:8885`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_connect() || e.is_timeout() {
            ApiError::Connection(format!("Cannot connect to {}", self.base_url))
        } else {
            ApiError::Http(e)
        }
    }

    async fn parse<R: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<R, ApiError> {
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::Relay { status, message });
        }
        response.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn get<R: serde::de::DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.parse(response).await
    }

    async fn post<R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<R, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.parse(response).await
    }

    /// Bridge status document, passed through verbatim.
    pub async fn status(&self) -> Result<serde_json::Value, ApiError> {
        self.get("/api/status").await
    }

    /// Conversation history.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let response: HistoryResponse = self.get("/api/history").await?;
        Ok(response.history)
    }

    /// Reset the agent session; clears the relay's history too.
    pub async fn reset(&self) -> Result<serde_json::Value, ApiError> {
        self.post("/api/reset", serde_json::json!({})).await
    }

    /// Current allow-list.
    pub async fn whitelist(&self) -> Result<WhitelistResponse, ApiError> {
        self.get("/api/admin/whitelist").await
    }

    /// Add an entry to the allow-list.
    pub async fn whitelist_add(&self, address: &str) -> Result<WhitelistResponse, ApiError> {
        self.post(
            "/api/admin/whitelist/add",
            serde_json::json!({ "address": address }),
        )
        .await
    }

    /// Remove an entry from the allow-list.
    pub async fn whitelist_remove(&self, address: &str) -> Result<WhitelistResponse, ApiError> {
        self.post(
            "/api/admin/whitelist/remove",
            serde_json::json!({ "address": address }),
        )
        .await
    }

    /// Persisted working directory.
    pub async fn work_dir(&self) -> Result<WorkDirResponse, ApiError> {
        self.get("/api/admin/workdir").await
    }

    /// Set the persisted working directory.
    pub async fn set_work_dir(&self, dir: &str) -> Result<WorkDirResponse, ApiError> {
        self.post("/api/admin/workdir", serde_json::json!({ "workDir": dir }))
            .await
    }

    /// Clients seen by the relay since startup.
    pub async fn clients(&self) -> Result<ClientsResponse, ApiError> {
        self.get("/api/admin/clients").await
    }

    /// Relay counters.
    pub async fn metrics(&self) -> Result<MetricsResponse, ApiError> {
        self.get("/api/admin/metrics").await
    }
}
