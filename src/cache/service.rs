//! Cache Service
//!
//! A thin validating facade over [`Storage`] and the single API surface
//! every protocol front-end talks to. It rejects empty keys uniformly,
//! translates TTL conventions into storage operations, and encodes the
//! TTL sentinels the wire protocol expects.
//!
//! ## TTL conventions
//!
//! - `set` with `ttl_secs == 0` substitutes the configured default TTL;
//!   callers never see that substitution. Negative means "no expiration".
//! - `expire` with `ttl_secs <= 0` clears the expiration (the key
//!   persists forever), mirroring the write-path convention.
//! - `ttl` reports -2 for an absent key, -1 for a persistent key, and
//!   otherwise the remaining whole seconds rounded up.

use crate::storage::{KeyTtl, Storage};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the cache service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// An empty string was supplied where a key is required
    #[error("key cannot be empty")]
    KeyEmpty,

    /// The operation requires an existing, non-expired key
    #[error("key not found")]
    KeyNotFound,
}

/// The validating facade shared by all front-ends.
#[derive(Debug, Clone)]
pub struct CacheService {
    storage: Arc<Storage>,
    default_ttl: Duration,
}

impl CacheService {
    /// Creates a cache service over `storage`.
    ///
    /// `default_ttl` is applied to writes that pass a TTL of zero; a zero
    /// `default_ttl` means such writes are persistent.
    pub fn new(storage: Arc<Storage>, default_ttl: Duration) -> Self {
        Self {
            storage,
            default_ttl,
        }
    }

    /// Stores `value` under `key`.
    ///
    /// `ttl_secs` semantics: 0 means "use the default TTL", positive sets
    /// that many seconds, negative means "no expiration".
    pub fn set(&self, key: &str, value: Bytes, ttl_secs: i64) -> Result<(), CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyEmpty);
        }

        let ttl = if ttl_secs == 0 {
            if self.default_ttl.is_zero() {
                None
            } else {
                Some(self.default_ttl)
            }
        } else if ttl_secs > 0 {
            Some(Duration::from_secs(ttl_secs as u64))
        } else {
            None
        };

        self.storage.set(key, value, ttl);
        Ok(())
    }

    /// Looks up `key`; `Ok(None)` when absent or expired.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyEmpty);
        }
        Ok(self.storage.get(key))
    }

    /// Removes `key`; reports whether a live entry existed.
    pub fn delete(&self, key: &str) -> Result<bool, CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyEmpty);
        }
        Ok(self.storage.delete(key))
    }

    /// Whether `key` is present and not expired.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyEmpty);
        }
        Ok(self.storage.exists(key))
    }

    /// Sets or clears the expiration of an existing key.
    ///
    /// `ttl_secs <= 0` clears the expiration. Fails with `KeyNotFound`
    /// when the key is absent or already expired.
    pub fn expire(&self, key: &str, ttl_secs: i64) -> Result<(), CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyEmpty);
        }

        let ttl = if ttl_secs > 0 {
            Some(Duration::from_secs(ttl_secs as u64))
        } else {
            None
        };

        if self.storage.set_ttl(key, ttl) {
            Ok(())
        } else {
            Err(CacheError::KeyNotFound)
        }
    }

    /// Remaining lifetime of `key` in seconds.
    ///
    /// -2 when absent or expired, -1 when persistent, otherwise the
    /// remaining seconds rounded up (so a freshly set 10-second TTL
    /// reads back as 10, not 9).
    pub fn ttl(&self, key: &str) -> Result<i64, CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyEmpty);
        }

        Ok(match self.storage.ttl(key) {
            KeyTtl::Missing => -2,
            KeyTtl::Persistent => -1,
            KeyTtl::Remaining(remaining) => {
                let secs = remaining.as_secs();
                if remaining.subsec_nanos() > 0 {
                    secs as i64 + 1
                } else {
                    secs as i64
                }
            }
        })
    }

    /// All live keys matching `pattern`; an empty pattern matches everything.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let pattern = if pattern.is_empty() { "*" } else { pattern };
        self.storage.keys(pattern)
    }
}
