//! Command Handler Module
//!
//! The command processing layer: receives parsed RESP2 values, validates
//! them structurally, and executes them against the cache service.
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP2 Parser   │  (protocol module)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │  CacheService   │  (cache module)
//! └─────────────────┘
//! ```
//!
//! Supported commands: `PING`, `SET` (with `EX`), `GET`, `DEL`, `EXISTS`,
//! `EXPIRE`, `TTL`, `KEYS`.

pub mod handler;

pub use handler::CommandHandler;
