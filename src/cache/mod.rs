//! Cache Service Module
//!
//! The validating facade between protocol front-ends and storage. Any
//! front-end (the RESP2 server here, or an HTTP adapter built on top of
//! this crate) consumes cache semantics exclusively through
//! [`CacheService`]; nothing above this layer touches [`crate::storage`]
//! directly.

pub mod service;

pub use service::{CacheError, CacheService};
