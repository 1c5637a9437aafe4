//! Upstream bridge transport.

pub mod client;

pub use client::{BridgeClient, BridgeTransport, EventStream, ProxyReply, UpstreamError};
