//! nh-relay - Not Hamburger relay service
//!
//! Receives a data-URL image from the client, forwards it with a fixed
//! prompt to the upstream vision model, normalizes the answer to
//! `HAMBURGER` / `NOT_HAMBURGER` and returns it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nh_common::config::{config_file_path, load_toml_config};
use nh_common::logging;
use nh_relay::config::RelayOverrides;
use nh_relay::keepalive::spawn_keepalive;
use nh_relay::{build_router, AppState, DeploymentMode, RelayConfig};
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for nh-relay
///
/// Every option can also come from the environment or the `[relay]` section
/// of the config file.
#[derive(Parser, Debug)]
#[command(name = "nh-relay")]
#[command(about = "Relay between the Not Hamburger client and the upstream vision model")]
#[command(version)]
struct Args {
    /// Config file (default: $NH_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on [env: PORT]
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind [env: NH_BIND_ADDR]
    #[arg(long)]
    bind_addr: Option<String>,

    /// Upstream chat-completion endpoint [env: NH_UPSTREAM_URL]
    #[arg(long)]
    upstream_url: Option<String>,

    /// Upstream model identifier [env: NH_UPSTREAM_MODEL]
    #[arg(long)]
    model: Option<String>,

    /// development or production [env: NH_DEPLOYMENT]
    #[arg(long)]
    deployment: Option<DeploymentMode>,

    /// Externally reachable base URL [env: NH_PUBLIC_URL]
    #[arg(long)]
    public_url: Option<String>,
}

impl Args {
    fn overrides(&self) -> RelayOverrides {
        RelayOverrides {
            port: self.port,
            bind_addr: self.bind_addr.clone(),
            // The credential is only read from the environment or the config file
            api_key: None,
            upstream_url: self.upstream_url.clone(),
            upstream_model: self.model.clone(),
            deployment: self.deployment,
            public_url: self.public_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before anything logs
    let log_filter = logging::init(std::io::stdout);

    info!(
        "Starting nh-relay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("NH_GIT_HASH"),
        env!("NH_BUILD_TIMESTAMP"),
        env!("NH_BUILD_PROFILE")
    );

    let config_path = config_file_path(args.config.as_deref());
    let toml_config = load_toml_config(config_path.as_deref()).context("Failed to load config file")?;
    log_filter
        .apply_config_level(&toml_config.logging.level)
        .context("Invalid logging configuration")?;
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using environment and defaults"),
    }

    let config = RelayConfig::resolve(args.overrides(), &toml_config.relay)
        .context("Invalid relay configuration")?;
    let addr = config.socket_addr()?;

    info!("Environment: {}", config.deployment);
    info!("Upstream: {} ({})", config.upstream_url, config.upstream_model);
    if !config.has_credential() {
        warn!("OPENROUTER_API_KEY is not set; /analyze-image will answer 500 until it is");
    }

    let keepalive = (config.deployment == DeploymentMode::Production)
        .then(|| spawn_keepalive(config.keepalive_url(), config.keepalive_interval));

    let state = AppState::new(config).context("Failed to create upstream client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server is running on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = keepalive {
        handle.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
