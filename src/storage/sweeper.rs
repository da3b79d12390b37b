//! Background Cleanup Sweeper
//!
//! Lazy expiration keeps expired entries invisible but leaves them in
//! memory. This task reclaims them: on a fixed interval it asks the
//! storage table to purge everything past its deadline.
//!
//! The sweeper runs as a single Tokio task, independent of client
//! traffic. It holds the exclusive lock only for the duration of one
//! sweep and stops when the process-wide shutdown signal fires.

use crate::storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawns the cleanup sweeper as a background task.
///
/// The task ticks every `interval`, purges expired entries, and exits
/// when `shutdown_rx` observes the shutdown broadcast. The returned
/// handle lets the caller await task exit during teardown.
pub fn spawn_sweeper(
    storage: Arc<Storage>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "cleanup sweeper started");
    tokio::spawn(sweeper_loop(storage, interval, shutdown_rx))
}

async fn sweeper_loop(
    storage: Arc<Storage>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so the first sweep
    // happens one full interval after startup.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let purged = storage.cleanup_expired();
                if purged > 0 {
                    info!(purged, "cleaned expired keys");
                }
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("cleanup sweeper stopping");
                    return;
                }
            }
        }
    }
}
