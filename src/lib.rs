//! # EmberKV
//!
//! An in-memory key-value cache server speaking the RESP2 wire protocol
//! over TCP, with per-key TTL expiration.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  TCP Server                     │
//! │              (accept loop, shutdown)            │
//! └──────────────────────┬──────────────────────────┘
//!                        │ one task per client
//! ┌──────────────────────▼──────────────────────────┐
//! │              Connection Handler                 │
//! │        (read buffer, RESP2 parse, reply)        │
//! └──────────────────────┬──────────────────────────┘
//! ┌──────────────────────▼──────────────────────────┐
//! │               Command Handler                   │
//! │   PING SET GET DEL EXISTS EXPIRE TTL KEYS       │
//! └──────────────────────┬──────────────────────────┘
//! ┌──────────────────────▼──────────────────────────┐
//! │                Cache Service                    │
//! │       (validation, TTL conventions)             │
//! └──────────────────────┬──────────────────────────┘
//! ┌──────────────────────▼──────────────────────────┐
//! │                   Storage                       │
//! │   RwLock<HashMap> + background expiry sweeper   │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Expiration
//!
//! Expired keys are never served: every read path checks the deadline
//! before returning ([lazy expiration]). Memory is reclaimed by a
//! background sweeper that periodically deletes expired entries.
//!
//! [lazy expiration]: crate::storage::Storage::get
//!
//! ## Quick start
//!
//! ```no_run
//! use emberkv::cache::CacheService;
//! use emberkv::commands::CommandHandler;
//! use emberkv::config::Config;
//! use emberkv::server::Server;
//! use emberkv::storage::Storage;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let storage = Arc::new(Storage::new());
//!     let cache = CacheService::new(Arc::clone(&storage), config.default_ttl);
//!     let handler = CommandHandler::new(cache);
//!
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     let server = Server::bind(&config, handler, shutdown_rx).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

pub use cache::{CacheError, CacheService};
pub use commands::CommandHandler;
pub use config::Config;
pub use protocol::{ParseError, RespParser, RespValue};
pub use server::Server;
pub use storage::Storage;

/// Crate version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
