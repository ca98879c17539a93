//! llm-relay
//!
//! Browser-facing HTTP relay for LLM provider APIs.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser                         llm-relay                          Upstream API
//!  ─────────┐   ┌──────────────────────────────────────────────────┐
//!  request  │   │ ┌──────────┐   ┌──────────┐   ┌──────────────┐   │
//!  ─────────┼──▶│ │  target  │──▶│ forward  │──▶│  hyper pool  │───┼──▶  https://api...
//!           │   │ │ resolver │   │          │   └──────┬───────┘   │
//!           │   │ └────┬─────┘   └────┬─────┘          │           │
//!           │   │      │ error        │ error          ▼           │
//!           │   │      ▼              ▼         ┌──────────────┐   │
//!  ◀────────┼───│ ┌───────────────────────┐     │   response   │◀──┼───  streamed body
//!  response │   │ │ error mapper 400/5xx  │     │    relay     │   │
//!           │   │ └───────────────────────┘     └──────────────┘   │
//!           │   │              CORS + trace layers                 │
//!  ─────────┘   └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use llm_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use llm_relay::lifecycle::{signals, Shutdown};
use llm_relay::observability::{logging, metrics};
use llm_relay::RelayServer;

#[derive(Parser)]
#[command(name = "llm-relay")]
#[command(about = "Relay browser requests to arbitrary HTTP APIs", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener bind address (overrides the config file).
    #[arg(short, long)]
    bind: Option<String>,

    /// First path segment under which targets are mounted.
    #[arg(long)]
    mount_prefix: Option<String>,

    /// Validate upstream TLS certificates.
    #[arg(long)]
    verify_upstream_tls: bool,

    /// Maximum wait for upstream response headers, in milliseconds.
    #[arg(long)]
    first_byte_timeout_ms: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<RelayConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RelayConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(prefix) = self.mount_prefix {
            config.relay.mount_prefix = prefix;
        }
        if self.verify_upstream_tls {
            config.relay.verify_upstream_tls = true;
        }
        if let Some(ms) = self.first_byte_timeout_ms {
            config.relay.first_byte_timeout_ms = ms;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability);
    tracing::info!("llm-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server = RelayServer::new(config)?;
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
