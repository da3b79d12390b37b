//! EmberKV server binary.
//!
//! Wires the pieces together: configuration from the environment, the
//! shared store with its background sweeper, the command handler, and
//! the TCP server. Runs until Ctrl-C, then shuts down gracefully.

use anyhow::Context;
use emberkv::cache::CacheService;
use emberkv::commands::CommandHandler;
use emberkv::config::Config;
use emberkv::server::Server;
use emberkv::storage::{spawn_sweeper, Storage};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!(
        version = emberkv::VERSION,
        host = %config.host,
        port = config.port,
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        default_ttl_secs = config.default_ttl.as_secs(),
        "starting emberkv"
    );

    let storage = Arc::new(Storage::new());
    let cache = CacheService::new(Arc::clone(&storage), config.default_ttl);
    let command_handler = CommandHandler::new(cache);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = spawn_sweeper(
        Arc::clone(&storage),
        config.cleanup_interval,
        shutdown_rx.clone(),
    );

    let server = Server::bind(&config, command_handler, shutdown_rx)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    let server_task = tokio::spawn(server.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    // Ignore send errors: a closed channel means everything already stopped.
    let _ = shutdown_tx.send(true);

    if let Err(e) = server_task.await {
        error!(error = %e, "server task failed");
    }
    if let Err(e) = sweeper.await {
        error!(error = %e, "sweeper task failed");
    }

    info!("shutdown complete");
    Ok(())
}
