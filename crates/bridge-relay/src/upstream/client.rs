//! Upstream bridge transport.
//!
//! `BridgeTransport` is the seam the relay session and the proxied JSON
//! handlers call through; tests swap in a scripted implementation.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use thiserror::Error;

/// Errors talking to the upstream bridge.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot connect to bridge at {0}")]
    Connect(String),
    #[error("bridge request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bridge returned non-event-stream response: {0}")]
    BadEventResponse(u16),
}

/// Raw byte stream from the bridge's events endpoint.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// Status and body of a proxied JSON exchange, passed through to the client.
#[derive(Debug, Clone)]
pub struct ProxyReply {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Transport to the upstream bridge.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Open the long-lived event stream.
    async fn events(&self) -> Result<EventStream, UpstreamError>;

    /// Forward a JSON POST body to `path`, returning the bridge's status and
    /// body verbatim.
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ProxyReply, UpstreamError>;

    /// Read the bridge's status document.
    async fn status(&self) -> Result<ProxyReply, UpstreamError>;
}

/// HTTP implementation over reqwest.
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: String,
}

impl BridgeClient {
    /// `base_url` without a trailing slash, e.g. `http://127.0.0.1:8886`.
    ///
    /// Only a connect timeout is configured. A total request timeout would
    /// kill open event streams, which have no deadline by design.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_connect() || e.is_timeout() {
            UpstreamError::Connect(self.base_url.clone())
        } else {
            UpstreamError::Http(e)
        }
    }
}

#[async_trait]
impl BridgeTransport for BridgeClient {
    async fn events(&self) -> Result<EventStream, UpstreamError> {
        let response = self
            .client
            .get(self.url("/events"))
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(UpstreamError::BadEventResponse(response.status().as_u16()));
        }

        Ok(response.bytes_stream().map_err(UpstreamError::Http).boxed())
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ProxyReply, UpstreamError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(ProxyReply { status, body })
    }

    async fn status(&self) -> Result<ProxyReply, UpstreamError> {
        let response = self
            .client
            .get(self.url("/status"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(ProxyReply { status, body })
    }
}
