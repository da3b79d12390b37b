//! TCP Server
//!
//! The accept loop. Binds the configured address, accepts connections,
//! and spawns one task per client. Accept failures are logged and the
//! loop continues; a transient error on one accept must not take the
//! server down.
//!
//! Shutdown is cooperative: the loop watches the process-wide shutdown
//! channel, stops accepting when it fires, and then joins every
//! connection task so in-flight commands finish their replies.

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::connection::{handle_connection, ConnectionStats};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// The listening server.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    shutdown_rx: watch::Receiver<bool>,
    connections: JoinSet<()>,
}

impl Server {
    /// Binds to the address in `config`.
    ///
    /// Fails when the address is unparseable or the port is taken; the
    /// caller decides whether that is fatal (for the binary it is).
    pub async fn bind(
        config: &Config,
        command_handler: CommandHandler,
        shutdown_rx: watch::Receiver<bool>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "server listening");

        Ok(Self {
            listener,
            local_addr,
            command_handler,
            stats: Arc::new(ConnectionStats::new()),
            shutdown_rx,
            connections: JoinSet::new(),
        })
    }

    /// The actual bound address (useful when the port was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Connection counters shared with every handler task.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until the shutdown channel fires, then joins
    /// all connection tasks.
    pub async fn run(mut self) {
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!(client = %addr, "accepted connection");
                            self.connections.spawn(handle_connection(
                                stream,
                                addr,
                                self.command_handler.clone(),
                                Arc::clone(&self.stats),
                                self.shutdown_rx.clone(),
                            ));
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                        }
                    }

                    // Reap finished connection tasks so the set does not
                    // grow unboundedly on long-running servers.
                    while let Some(result) = self.connections.try_join_next() {
                        if let Err(e) = result {
                            error!(error = %e, "connection task panicked");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        self.drain().await;
    }

    /// Joins every remaining connection task.
    async fn drain(&mut self) {
        let active = self.stats.active_connections.load(Ordering::Relaxed);
        info!(active, "shutting down, draining connections");

        while let Some(result) = self.connections.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "connection task panicked");
            }
        }

        info!("all connections closed");
    }
}
