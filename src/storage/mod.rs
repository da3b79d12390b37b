//! Storage Module
//!
//! The sole owner of the key-value table: a thread-safe map with per-key
//! TTL, plus the background sweeper that reclaims expired entries.
//!
//! ## Expiration
//!
//! - **Lazy**: readers filter entries past their deadline, so an expired
//!   key is invisible the instant its TTL elapses.
//! - **Sweep**: the background sweeper periodically removes expired
//!   entries so memory is reclaimed even for keys never touched again.
//!
//! ## Example
//!
//! ```
//! use emberkv::storage::{KeyTtl, Storage};
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let storage = Storage::new();
//! storage.set("session", Bytes::from("token123"), Some(Duration::from_secs(3600)));
//! assert!(storage.exists("session"));
//! assert!(matches!(storage.ttl("session"), KeyTtl::Remaining(_)));
//! ```

pub mod engine;
pub mod sweeper;

// Re-export commonly used types
pub use engine::{glob_match, Entry, KeyTtl, Storage};
pub use sweeper::spawn_sweeper;
