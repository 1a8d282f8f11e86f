//! Caching reverse proxy binary.
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 fastmirror                   │
//!                    │                                              │
//!   Client Request   │  ┌────────┐   ┌────────────┐   ┌──────────┐  │
//!   ─────────────────┼─▶│ server │──▶│ dispatcher │──▶│ handler  │  │
//!                    │  └────────┘   └────────────┘   │ variant  │  │
//!                    │                                └────┬─────┘  │
//!                    │                     ┌───────────────┤        │
//!                    │                     ▼               ▼        │
//!                    │               ┌──────────┐    ┌───────────┐  │      Origin
//!   Client Response  │               │  cache   │    │  origin   │◀─┼────▶ Server
//!   ◀────────────────┼───────────────│  store   │    │  client   │  │
//!                    │               └──────────┘    └───────────┘  │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from an optional TOML file; command-line flags
//! override file values and the merged result is validated once before the
//! server starts.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fastmirror::cache::CacheStore;
use fastmirror::config::{read_config, validate_config, ConfigError, MirrorConfig, RunMode};
use fastmirror::handlers::Dispatcher;
use fastmirror::http::HttpServer;

#[derive(Parser)]
#[command(name = "fastmirror")]
#[command(about = "Caching reverse proxy with proxy, local and hybrid modes", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run mode
    #[arg(short, long, value_enum)]
    mode: Option<RunMode>,

    /// Origin base URL (required for proxy and hybrid modes)
    #[arg(short, long)]
    origin: Option<String>,

    /// Listen address, e.g. 0.0.0.0:8000
    #[arg(short, long)]
    listen: Option<String>,

    /// Cache root directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Origin request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// File values first, flags override.
    fn apply_overrides(&self, config: &mut MirrorConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(origin) = &self.origin {
            config.origin.base_url = Some(origin.clone());
        }
        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache.dir = cache_dir.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeouts.request_secs = timeout_secs;
        }
        if let Some(log_level) = &self.log_level {
            config.observability.log_level = log_level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => MirrorConfig::default(),
    };
    cli.apply_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    // Initialize tracing subscriber; RUST_LOG wins over the config level.
    let default_filter = format!(
        "fastmirror={level},tower_http={level}",
        level = config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        mode = %config.mode,
        bind_address = %config.listener.bind_address,
        origin = config.origin.base_url.as_deref().unwrap_or("-"),
        cache_dir = %config.cache.dir.display(),
        request_timeout_secs = config.timeouts.request_secs,
        "configuration loaded"
    );

    let store = Arc::new(CacheStore::new(&config.cache.dir)?);
    let dispatcher = Dispatcher::from_config(&config, store)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    let server = HttpServer::new(&config, dispatcher);
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
