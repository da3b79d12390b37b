//! Connection Module
//!
//! Per-connection I/O: each accepted TCP stream gets a
//! [`ConnectionHandler`] running in its own task, with a private read
//! buffer and parser. [`ConnectionStats`] aggregates lifecycle counters
//! across all connections.

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
