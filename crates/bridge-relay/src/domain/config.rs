//! Relay configuration with validation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Main relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Client-facing HTTP server.
    pub server: ServerConfig,
    /// Upstream bridge connection.
    pub upstream: UpstreamConfig,
    /// Admission control.
    pub access: AccessConfig,
    /// Settings-file persistence.
    pub persistence: PersistenceConfig,
}

impl RelayConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&body)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port cannot be 0".into()));
        }
        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "upstream.base_url must be an http(s) URL, got {:?}",
                self.upstream.base_url
            )));
        }
        if self.upstream.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.connect_timeout_secs cannot be 0".into(),
            ));
        }
        Ok(())
    }

    /// Client-facing bind address.
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

/// Client-facing HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Port (default: 8885).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8885,
        }
    }
}

/// Upstream bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the bridge (default: the bridge's local port).
    pub base_url: String,
    /// Connect timeout in seconds. No timeout is applied to an open event
    /// stream; sessions stay open as long as the upstream does.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8886".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Admission-control configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Comma-separated static allow-list: `address` or `address/prefix`
    /// entries. Empty means no static policy (fail-open unless dynamic
    /// entries exist).
    #[serde(rename = "staticWhitelist")]
    pub static_whitelist: String,
}

/// Settings-file persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Path of the JSON settings document (allow-list and workDir).
    pub settings_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("relay-settings.json"),
        }
    }
}
