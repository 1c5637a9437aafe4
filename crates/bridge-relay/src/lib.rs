//! Bridge Relay - SSE fan-in relay and admission control for a local
//! agent bridge.
//!
//! The relay sits between browser clients and an upstream bridge process
//! that wraps an interactive agent behind a small HTTP API. It does three
//! things:
//!
//! - **Relay**: each `GET /api/events` client gets its own upstream event
//!   stream, forwarded byte-for-byte, while the relay reassembles the
//!   frames in passing to maintain a conversation history.
//! - **Admission**: mutating endpoints are guarded by an IPv4 allow-list
//!   (exact addresses and CIDR blocks); loopback always passes and an
//!   empty rule set means open access.
//! - **Admin**: allow-list, working-directory, client, and metrics
//!   endpoints for the operator, with the allow-list persisted through a
//!   JSON settings file shared with other tools.
//!
//! ```ignore
//! use bridge_relay::{RelayConfig, RelayService};
//!
//! let config = RelayConfig::default();
//! let mut service = RelayService::new(config)?;
//! service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod access;
pub mod domain;
pub mod metrics;
pub mod middleware;
pub mod relay;
pub mod service;
pub mod upstream;

pub use access::{AccessPolicy, AccessRule, AllowListStore};
pub use domain::config::RelayConfig;
pub use domain::error::{ConfigError, ErrorBody, RelayError, StoreError};
pub use domain::event::BridgeEvent;
pub use domain::history::{ConversationEntry, ConversationLog, Role};
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use relay::FrameReassembler;
pub use service::{AppState, RelayService};
pub use upstream::{BridgeClient, BridgeTransport, EventStream, ProxyReply, UpstreamError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
