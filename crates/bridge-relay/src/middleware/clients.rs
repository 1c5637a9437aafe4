//! Per-address client tracking middleware.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tower::{Layer, Service};

use super::admission::client_addr;
use crate::metrics::RelayMetrics;

/// Observation record for one source address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub requests: u64,
}

/// Table of every source address seen since startup.
///
/// Records are never evicted; under long uptime with many distinct source
/// addresses this grows without bound. Flagged for design review rather
/// than silently fixed here.
#[derive(Default)]
pub struct ClientTable {
    clients: DashMap<String, ClientRecord>,
}

impl ClientTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request from `addr`.
    pub fn touch(&self, addr: &str) {
        let now = Utc::now();
        self.clients
            .entry(addr.to_string())
            .and_modify(|record| {
                record.last_seen = now;
                record.requests += 1;
            })
            .or_insert_with(|| ClientRecord {
                first_seen: now,
                last_seen: now,
                requests: 1,
            });
    }

    /// Current table, most recently seen first.
    pub fn snapshot(&self) -> Vec<ClientView> {
        let mut clients: Vec<ClientView> = self
            .clients
            .iter()
            .map(|entry| ClientView {
                addr: entry.key().clone(),
                record: entry.value().clone(),
            })
            .collect();
        clients.sort_by(|a, b| {
            b.record
                .last_seen
                .cmp(&a.record.last_seen)
                .then_with(|| a.addr.cmp(&b.addr))
        });
        clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Wire view of one tracked client.
#[derive(Debug, Clone, Serialize)]
pub struct ClientView {
    pub addr: String,
    #[serde(flatten)]
    pub record: ClientRecord,
}

/// Layer recording every request passing through it, admitted or not.
#[derive(Clone)]
pub struct ClientTrackerLayer {
    table: Arc<ClientTable>,
    metrics: Arc<RelayMetrics>,
}

impl ClientTrackerLayer {
    pub fn new(table: Arc<ClientTable>, metrics: Arc<RelayMetrics>) -> Self {
        Self { table, metrics }
    }
}

impl<S> Layer<S> for ClientTrackerLayer {
    type Service = ClientTrackerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientTrackerService {
            inner,
            table: Arc::clone(&self.table),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[derive(Clone)]
pub struct ClientTrackerService<S> {
    inner: S,
    table: Arc<ClientTable>,
    metrics: Arc<RelayMetrics>,
}

impl<S> Service<Request<Body>> for ClientTrackerService<S>
where
    S: Service<Request<Body>, Response = Response>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.table.touch(&client_addr(&req));
        self.metrics.record_request();
        self.inner.call(req)
    }
}
