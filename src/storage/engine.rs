//! Thread-Safe Storage with TTL Support
//!
//! The core key-value table: one `HashMap` behind a readers-writer lock.
//! Reads take the shared lock, writes and the sweep take the exclusive
//! lock. Lock hold time is O(1) for single-key operations; `keys` and
//! `cleanup_expired` scan the whole table.
//!
//! ## Expiration model
//!
//! Every entry carries an optional absolute deadline. An entry past its
//! deadline is invisible to every reader (lazy expiration) but stays in
//! the table until the periodic sweep removes it. The read path never
//! deletes, so `get`/`exists`/`ttl`/`keys` only ever need the shared lock;
//! physical reclamation is the sweeper's job.
//!
//! Values are copied out on read and replaced wholesale on write - no
//! caller ever holds a reference into the table.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A stored value with its optional expiration deadline.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: Bytes,
    /// Absolute expiration instant; `None` means the entry never expires
    pub expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Bytes, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.and_then(deadline_from_now),
        }
    }

    /// Whether this entry's deadline has passed.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}

/// Remaining lifetime of a key, as reported by [`Storage::ttl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key absent, or present but already expired
    Missing,
    /// Key present with no expiration
    Persistent,
    /// Key present; expires after this duration
    Remaining(Duration),
}

/// The in-memory key-value table.
///
/// Designed to be wrapped in an `Arc` and shared by every connection task
/// plus the background sweeper. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use emberkv::storage::Storage;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let storage = Storage::new();
/// storage.set("name", Bytes::from("ember"), None);
/// assert_eq!(storage.get("name"), Some(Bytes::from("ember")));
///
/// storage.set("session", Bytes::from("abc123"), Some(Duration::from_secs(60)));
/// ```
#[derive(Debug, Default)]
pub struct Storage {
    data: RwLock<HashMap<String, Entry>>,
}

impl Storage {
    /// Creates an empty storage table.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the value for `key`, or `None` if it is absent or expired.
    ///
    /// Expired entries are filtered, not removed; the sweep reclaims them.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let data = self.data.read().unwrap();
        data.get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key`, replacing any existing entry wholesale.
    ///
    /// `ttl` of `None` stores a persistent entry; `Some(d)` expires the
    /// entry `d` from now. A previous entry's expiration policy never
    /// survives a set.
    pub fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) {
        let mut data = self.data.write().unwrap();
        data.insert(key.to_string(), Entry::new(value, ttl));
    }

    /// Removes `key` unconditionally.
    ///
    /// Reports `true` only if the entry was present and not expired:
    /// an expired-but-unswept entry is physically removed here but counts
    /// as absent, consistent with `get` and `exists`.
    pub fn delete(&self, key: &str) -> bool {
        let mut data = self.data.write().unwrap();
        match data.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    /// Whether `key` is present and not expired.
    pub fn exists(&self, key: &str) -> bool {
        let data = self.data.read().unwrap();
        data.get(key).map(|e| !e.is_expired()).unwrap_or(false)
    }

    /// Reports the remaining lifetime of `key` as a three-way result.
    pub fn ttl(&self, key: &str) -> KeyTtl {
        let data = self.data.read().unwrap();
        let entry = match data.get(key) {
            Some(entry) => entry,
            None => return KeyTtl::Missing,
        };
        match entry.expires_at {
            None => KeyTtl::Persistent,
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    KeyTtl::Missing
                } else {
                    KeyTtl::Remaining(deadline - now)
                }
            }
        }
    }

    /// Adjusts the expiration of an existing key without touching its value.
    ///
    /// `Some(d)` sets a new deadline `d` from now; `None` clears the
    /// deadline (the key persists forever). Returns `false` if the key is
    /// absent or already expired.
    pub fn set_ttl(&self, key: &str, ttl: Option<Duration>) -> bool {
        let mut data = self.data.write().unwrap();
        match data.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expires_at = ttl.and_then(deadline_from_now);
                true
            }
            _ => false,
        }
    }

    /// Returns all live keys matching a glob pattern.
    ///
    /// `*` matches any run of characters (including none) and `?` matches
    /// exactly one. Expired keys are never returned. Order is unspecified.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let data = self.data.read().unwrap();
        data.iter()
            .filter(|(_, entry)| !entry.is_expired())
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let data = self.data.read().unwrap();
        data.values().filter(|e| !e.is_expired()).count()
    }

    /// Whether the table holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry. Called by the background sweeper.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut data = self.data.write().unwrap();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired());
        before - data.len()
    }
}

/// Converts a TTL into an absolute deadline.
///
/// A TTL too large to represent as an `Instant` saturates to "no
/// expiration"; the arithmetic must never panic under the write lock,
/// and clients can send arbitrarily large second counts.
fn deadline_from_now(ttl: Duration) -> Option<Instant> {
    Instant::now().checked_add(ttl)
}

/// Glob matcher for key patterns: `*` matches any run of bytes,
/// `?` matches exactly one byte. Everything else matches literally.
///
/// Matching is byte-wise, not character-wise: a multibyte UTF-8
/// character needs one `?` per byte.
///
/// Iterative with single-star backtracking, so pathological patterns
/// cannot blow the stack.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();

    let (mut p, mut t) = (0, 0);
    // Position to resume from when a star's current match length fails.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            // Let the star swallow one more character and retry.
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    // Only trailing stars may remain.
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("value"), None);
        assert_eq!(storage.get("key"), Some(Bytes::from("value")));
    }

    #[test]
    fn get_nonexistent() {
        let storage = Storage::new();
        assert_eq!(storage.get("nonexistent"), None);
    }

    #[test]
    fn set_replaces_value_and_expiration() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("v1"), Some(Duration::from_secs(100)));
        storage.set("key", Bytes::from("v2"), None);

        assert_eq!(storage.get("key"), Some(Bytes::from("v2")));
        assert_eq!(storage.ttl("key"), KeyTtl::Persistent);
    }

    #[test]
    fn delete_existing_key() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("value"), None);
        assert!(storage.delete("key"));
        assert_eq!(storage.get("key"), None);
        assert!(!storage.delete("key"));
    }

    #[test]
    fn delete_expired_key_reports_absent() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("value"), Some(Duration::from_millis(10)));
        std::thread::sleep(Duration::from_millis(50));

        // Expired but not yet swept: delete removes it physically but the
        // key counts as absent, same as get and exists see it.
        assert!(!storage.delete("key"));
        assert_eq!(storage.get("key"), None);
    }

    #[test]
    fn exists_tracks_expiration() {
        let storage = Storage::new();
        assert!(!storage.exists("key"));

        storage.set("key", Bytes::from("value"), Some(Duration::from_millis(10)));
        assert!(storage.exists("key"));

        std::thread::sleep(Duration::from_millis(50));
        assert!(!storage.exists("key"));
    }

    #[test]
    fn lazy_expiration_on_get() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("value"), Some(Duration::from_millis(10)));
        assert_eq!(storage.get("key"), Some(Bytes::from("value")));

        std::thread::sleep(Duration::from_millis(50));

        // Invisible to readers even though no sweep has run.
        assert_eq!(storage.get("key"), None);
        // The later sweep still counts it exactly once.
        assert_eq!(storage.cleanup_expired(), 1);
        assert_eq!(storage.cleanup_expired(), 0);
    }

    #[test]
    fn ttl_three_states() {
        let storage = Storage::new();
        assert_eq!(storage.ttl("missing"), KeyTtl::Missing);

        storage.set("persistent", Bytes::from("v"), None);
        assert_eq!(storage.ttl("persistent"), KeyTtl::Persistent);

        storage.set("timed", Bytes::from("v"), Some(Duration::from_secs(100)));
        match storage.ttl("timed") {
            KeyTtl::Remaining(d) => {
                assert!(d <= Duration::from_secs(100));
                assert!(d > Duration::from_secs(98));
            }
            other => panic!("expected Remaining, got {:?}", other),
        }
    }

    #[test]
    fn ttl_monotonically_non_increasing() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("v"), Some(Duration::from_secs(100)));

        let first = match storage.ttl("key") {
            KeyTtl::Remaining(d) => d,
            other => panic!("expected Remaining, got {:?}", other),
        };
        std::thread::sleep(Duration::from_millis(20));
        let second = match storage.ttl("key") {
            KeyTtl::Remaining(d) => d,
            other => panic!("expected Remaining, got {:?}", other),
        };
        assert!(second <= first);
    }

    #[test]
    fn set_ttl_on_live_key() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("value"), None);

        assert!(storage.set_ttl("key", Some(Duration::from_secs(60))));
        assert!(matches!(storage.ttl("key"), KeyTtl::Remaining(_)));

        // Clearing the deadline persists the key; the value is untouched.
        assert!(storage.set_ttl("key", None));
        assert_eq!(storage.ttl("key"), KeyTtl::Persistent);
        assert_eq!(storage.get("key"), Some(Bytes::from("value")));
    }

    #[test]
    fn set_ttl_fails_on_missing_or_expired() {
        let storage = Storage::new();
        assert!(!storage.set_ttl("missing", Some(Duration::from_secs(1))));

        storage.set("key", Bytes::from("v"), Some(Duration::from_millis(10)));
        std::thread::sleep(Duration::from_millis(50));
        assert!(!storage.set_ttl("key", Some(Duration::from_secs(1))));
    }

    #[test]
    fn huge_ttl_saturates_to_persistent() {
        let storage = Storage::new();

        // A deadline beyond what Instant can represent must not panic
        // (a panic here would poison the lock for every other task);
        // it degrades to "no expiration".
        storage.set("k", Bytes::from("v"), Some(Duration::from_secs(u64::MAX)));
        assert_eq!(storage.get("k"), Some(Bytes::from("v")));
        assert_eq!(storage.ttl("k"), KeyTtl::Persistent);

        assert!(storage.set_ttl("k", Some(Duration::from_secs(i64::MAX as u64))));
        assert_eq!(storage.ttl("k"), KeyTtl::Persistent);

        // The store stays fully usable afterwards.
        storage.set("other", Bytes::from("w"), Some(Duration::from_secs(5)));
        assert!(storage.exists("other"));
        assert_eq!(storage.cleanup_expired(), 0);
    }

    #[test]
    fn persisted_key_survives_sweep() {
        let storage = Storage::new();
        storage.set("key", Bytes::from("v"), Some(Duration::from_millis(10)));
        assert!(storage.set_ttl("key", None));

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(storage.cleanup_expired(), 0);
        assert_eq!(storage.get("key"), Some(Bytes::from("v")));
    }

    #[test]
    fn keys_pattern_matching() {
        let storage = Storage::new();
        storage.set("user:1", Bytes::from("a"), None);
        storage.set("user:2", Bytes::from("b"), None);
        storage.set("order:1", Bytes::from("c"), None);

        let mut users = storage.keys("user:*");
        users.sort();
        assert_eq!(users, vec!["user:1", "user:2"]);

        let all = storage.keys("*");
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn keys_excludes_expired_and_has_no_duplicates() {
        let storage = Storage::new();
        storage.set("live", Bytes::from("a"), None);
        storage.set("dead", Bytes::from("b"), Some(Duration::from_millis(10)));
        std::thread::sleep(Duration::from_millis(50));

        let keys = storage.keys("*");
        assert_eq!(keys, vec!["live"]);
    }

    #[test]
    fn cleanup_expired_counts() {
        let storage = Storage::new();
        storage.set("key1", Bytes::from("v"), Some(Duration::from_millis(10)));
        storage.set("key2", Bytes::from("v"), Some(Duration::from_millis(10)));
        storage.set("key3", Bytes::from("v"), None);

        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(storage.cleanup_expired(), 2);
        assert_eq!(storage.len(), 1);
        assert!(storage.exists("key3"));
    }

    #[test]
    fn concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let storage = Arc::new(Storage::new());
        let mut handles = vec![];

        for i in 0..10 {
            let storage = Arc::clone(&storage);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    storage.set(&key, Bytes::from("value"), None);
                    assert_eq!(storage.get(&key), Some(Bytes::from("value")));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(storage.len(), 1000);
    }

    #[test]
    fn glob_star() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("h*llo", "hello"));
        assert!(glob_match("h*llo", "hllo"));
        assert!(glob_match("h*llo", "heeeello"));
        assert!(!glob_match("h*llo", "world"));
        assert!(glob_match("user:*", "user:42"));
        assert!(!glob_match("user:*", "order:42"));
    }

    #[test]
    fn glob_question_mark() {
        assert!(glob_match("h?llo", "hello"));
        assert!(glob_match("h?llo", "hallo"));
        assert!(!glob_match("h?llo", "hllo"));
        assert!(!glob_match("h?llo", "heello"));
    }

    #[test]
    fn glob_matches_bytes_not_characters() {
        // "é" is two bytes in UTF-8, so it takes two ?s (or a *).
        assert!(!glob_match("h?llo", "héllo"));
        assert!(glob_match("h??llo", "héllo"));
        assert!(glob_match("h*llo", "héllo"));
    }

    #[test]
    fn glob_literal_and_mixed() {
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exacts"));
        assert!(glob_match("a*b?c", "aXXXbYc"));
        assert!(!glob_match("a*b?c", "aXXXbc"));
        assert!(glob_match("**", "x"));
        assert!(glob_match("*?", "x"));
        assert!(!glob_match("*?", ""));
    }
}
