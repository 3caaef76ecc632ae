//! mount-gateway
//!
//! Serves statically mounted applications and per-file applications
//! discovered under a directory, over HTTP and WebSocket.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server (request id, timeout, limits, trace)
//!                 │
//!                 ├── upgrade: websocket ──▶ http::websocket bridge ─┐
//!                 ▼                                                 ▼
//!            DynamicDirectoryGateway  (/apps/<subpath>/ → per-file app, built once)
//!                 │ miss
//!                 ▼
//!            PrefixRouter  (/app1 → app, /api → upstream, ...)
//!                 │ miss
//!                 ▼
//!              404 / close 1008
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mount_gateway::config::{load_config, DirectoryConfig, GatewayConfig};
use mount_gateway::lifecycle::{build_application, Shutdown};
use mount_gateway::observability::{logging, metrics};
use mount_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "mount-gateway", version, about = "Multi-application HTTP/WebSocket gateway")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Serve every source file under this directory at `/apps`.
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = args.directory {
        let directory = config.directory.get_or_insert_with(DirectoryConfig::default);
        directory.root = root;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mount-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mounts = config.mounts.len(),
        directory = config.directory.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let application = build_application(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { shutdown.trigger_on_ctrl_c().await }
    });

    HttpServer::new(config, application)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
