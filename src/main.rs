//! Object storage proxy for OpenStack Swift
//!
//! This service exposes a small HTTP API that proxies object reads, writes
//! and deletes to an OpenStack Swift cluster, authenticating against the
//! Keystone identity service on every request.

mod config;
mod errors;
mod routes;
mod server;
mod storage;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment and optional config file
    let config = Config::from_env()?;

    // Initialize tracing with JSON output for structured logging. RUST_LOG
    // wins over the configured log level when set.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting swiftproxy");
    info!(?config, "Configuration loaded");

    // Initialize storage backend based on configuration
    let storage = storage::create_backend(&config)?;
    info!("Storage backend initialized");

    // Create and start the HTTP server
    let server = Server::new(config.clone(), storage);

    // Handle graceful shutdown
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal");
    };

    info!("Server starting on {}", config.server.bind_address);
    if let Err(e) = server.start(shutdown_signal).await {
        error!(error = %e, "Server error");
        return Err(e);
    }

    info!("Server shutdown complete");
    Ok(())
}
