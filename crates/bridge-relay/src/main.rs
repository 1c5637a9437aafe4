//! Bridge relay binary entry point.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bridge_relay::{RelayConfig, RelayService, VERSION};

/// SSE relay and admission control for a local agent bridge.
#[derive(Parser, Debug)]
#[command(name = "bridge-relay", version)]
struct Args {
    /// Path to a JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Listen port, overrides the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream bridge base URL, overrides the config file.
    #[arg(short, long)]
    upstream: Option<String>,

    /// Settings file for the persisted allow-list, overrides the config file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Comma-separated static allow-list entries (address or address/prefix).
    #[arg(long)]
    whitelist: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => RelayConfig::default(),
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.base_url = upstream;
        }
        if let Some(settings) = self.settings {
            config.persistence.settings_path = settings;
        }
        if let Some(whitelist) = self.whitelist {
            config.access.static_whitelist = whitelist;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Args::parse().into_config()?;
    config.validate().context("invalid configuration")?;

    info!(version = VERSION, "starting bridge relay");

    let service = RelayService::new(config).context("creating relay service")?;

    let shutdown = service.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown.send(true);
        }
    });

    service.start().await.context("relay server failed")?;

    Ok(())
}
