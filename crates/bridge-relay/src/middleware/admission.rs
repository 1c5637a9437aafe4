//! Admission-control middleware for guarded routes.
//!
//! Denials log the client address, method, and path, and answer with the
//! fixed forbidden body. Nothing about the configured rules leaks to the
//! caller.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::Response;
use tower::{Layer, Service};
use tracing::warn;

use crate::access::AccessPolicy;
use crate::domain::error::ErrorBody;
use crate::metrics::RelayMetrics;

/// Layer applying [`AccessPolicy`] to every request of the wrapped routes.
#[derive(Clone)]
pub struct AdmissionLayer {
    policy: Arc<AccessPolicy>,
    metrics: Arc<RelayMetrics>,
}

impl AdmissionLayer {
    pub fn new(policy: Arc<AccessPolicy>, metrics: Arc<RelayMetrics>) -> Self {
        Self { policy, metrics }
    }
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = AdmissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            policy: Arc::clone(&self.policy),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[derive(Clone)]
pub struct AdmissionService<S> {
    inner: S,
    policy: Arc<AccessPolicy>,
    metrics: Arc<RelayMetrics>,
}

impl<S> Service<Request<Body>> for AdmissionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let policy = Arc::clone(&self.policy);
        let metrics = Arc::clone(&self.metrics);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let client = client_addr(&req);

            if policy.is_allowed(&client) {
                return inner.call(req).await;
            }

            warn!(
                client = %client,
                method = %req.method(),
                path = %req.uri().path(),
                "request denied by allow-list"
            );
            metrics.record_denied();
            Ok(forbidden_response())
        })
    }
}

/// Observed source address of the request as a string.
///
/// A missing `ConnectInfo` extension yields a sentinel that is not loopback
/// and matches no rule, so a server wired without connect info denies
/// guarded traffic instead of trusting it.
pub(crate) fn client_addr<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forbidden_response() -> Response {
    let body = serde_json::to_vec(&ErrorBody::forbidden()).unwrap_or_default();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
