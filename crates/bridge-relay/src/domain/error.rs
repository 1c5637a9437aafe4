//! Relay error types and the fixed-shape wire error body.

use serde::{Deserialize, Serialize};

/// Configuration errors, fatal at startup only.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Allow-list store errors. Persistence failures are reported to the caller
/// of the mutating operation; the in-memory set stays mutated.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("entry must be a non-empty string")]
    EmptyEntry,
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode settings file: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the error is a caller mistake rather than a persistence fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyEntry)
    }
}

/// Service-level errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("server bind error: {0}")]
    Bind(std::io::Error),
}

/// Fixed-shape JSON error body, matching the upstream bridge's `{"error": ..}`
/// convention so clients handle both sides uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Denial response for guarded endpoints. Deliberately does not say which
    /// rule failed to match.
    pub fn forbidden() -> Self {
        Self::new("forbidden")
    }

    pub fn upstream_unavailable(details: impl std::fmt::Display) -> Self {
        Self::new(format!("upstream bridge unavailable: {details}"))
    }
}
