//! In-memory TTL response cache keyed by request URL.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde_json::Value;

/// Default time-to-live for cached responses (10 minutes).
const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Default maximum number of cached responses.
const DEFAULT_MAX_ENTRIES: usize = 500;

/// Default interval between background sweeps (5 minutes).
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Cache tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct CacheConfig {
    /// Maximum age of a servable entry.
    pub ttl: Duration,
    /// Maximum number of entries kept.
    pub max_entries: usize,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// A cached response body and the instant it was stored.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct CacheEntry {
    /// Parsed response body.
    pub data: Value,
    /// Write time.
    pub timestamp: Instant,
}

impl CacheEntry {
    /// Returns `true` while `now - timestamp < ttl`.
    #[must_use]
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.timestamp) < ttl
    }
}

/// Insertion-ordered response store with TTL and a size bound.
///
/// Eviction follows insertion order, not access order: reading an entry
/// never protects it from eviction. Rewriting a key moves it to the back.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct ResponseCache {
    /// Entry lifetime.
    ttl: Duration,
    /// Size bound.
    max_entries: usize,
    /// Entries by cache key.
    entries: HashMap<String, CacheEntry>,
    /// Keys from oldest to newest insertion.
    order: VecDeque<String>,
}

impl ResponseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Creates an empty cache from a `CacheConfig`.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl, config.max_entries)
    }

    /// Returns the configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries (fresh or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` is stored (fresh or not).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns a fresh entry's data.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_at(key, Instant::now())
    }

    /// Returns the entry's data if it is still fresh at `now`.
    #[must_use]
    pub fn get_at(&self, key: &str, now: Instant) -> Option<&Value> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| &entry.data)
    }

    /// Stores `data` under `key`, then enforces the size bound.
    pub fn insert(&mut self, key: String, data: Value) {
        self.insert_at(key, data, Instant::now());
    }

    /// Stores `data` under `key` as written at `timestamp`.
    pub fn insert_at(&mut self, key: String, data: Value, timestamp: Instant) {
        if self.entries.contains_key(&key) {
            self.order.retain(|k| *k != key);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, CacheEntry { data, timestamp });
        self.enforce_limit();
    }

    /// Drops entries stale at the current instant and re-applies the size bound.
    ///
    /// Returns the number of removed entries.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drops entries stale at `now` and re-applies the size bound.
    ///
    /// Returns the number of removed entries.
    pub fn sweep_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        self.enforce_limit();
        before.saturating_sub(self.entries.len())
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Evicts oldest insertions until `len() <= max_entries`.
    fn enforce_limit(&mut self) {
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!(key = %oldest, "evicted cache entry (size bound)");
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::arithmetic_side_effects)]

    use serde_json::json;

    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = CacheConfig::default();

        // Assert
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_get_fresh_entry() {
        // Arrange
        let mut cache = ResponseCache::new(10 * MINUTE, 10);
        let t0 = Instant::now();
        cache.insert_at(String::from("k"), json!({"id": 1}), t0);

        // Act
        let hit = cache.get_at("k", t0 + 9 * MINUTE);

        // Assert
        assert_eq!(hit, Some(&json!({"id": 1})));
    }

    #[test]
    fn test_get_expired_entry_is_miss() {
        // Arrange
        let mut cache = ResponseCache::new(10 * MINUTE, 10);
        let t0 = Instant::now();
        cache.insert_at(String::from("k"), json!(1), t0);

        // Act & Assert
        assert!(cache.get_at("k", t0 + 10 * MINUTE).is_none());
        assert!(cache.get_at("k", t0 + 11 * MINUTE).is_none());
        // Expired entries stay until swept or overwritten.
        assert!(cache.contains_key("k"));
    }

    #[test]
    fn test_size_bound_evicts_oldest_insertion() {
        // Arrange
        let max = 500;
        let mut cache = ResponseCache::new(10 * MINUTE, max);
        let t0 = Instant::now();

        // Act
        for i in 0..=max {
            cache.insert_at(format!("key-{i}"), json!(i), t0);
        }

        // Assert
        assert_eq!(cache.len(), max);
        assert!(!cache.contains_key("key-0"));
        assert!(cache.contains_key("key-1"));
        assert!(cache.contains_key(&format!("key-{max}")));
    }

    #[test]
    fn test_eviction_ignores_reads() {
        // Arrange
        let mut cache = ResponseCache::new(10 * MINUTE, 2);
        let t0 = Instant::now();
        cache.insert_at(String::from("a"), json!("a"), t0);
        cache.insert_at(String::from("b"), json!("b"), t0);

        // Act: reading "a" must not protect it
        assert!(cache.get_at("a", t0).is_some());
        cache.insert_at(String::from("c"), json!("c"), t0);

        // Assert
        assert!(!cache.contains_key("a"));
        assert!(cache.contains_key("b"));
        assert!(cache.contains_key("c"));
    }

    #[test]
    fn test_overwrite_moves_key_to_newest() {
        // Arrange
        let mut cache = ResponseCache::new(10 * MINUTE, 2);
        let t0 = Instant::now();
        cache.insert_at(String::from("a"), json!(1), t0);
        cache.insert_at(String::from("b"), json!(2), t0);

        // Act
        cache.insert_at(String::from("a"), json!(3), t0 + MINUTE);
        cache.insert_at(String::from("c"), json!(4), t0 + MINUTE);

        // Assert
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains_key("b"));
        assert_eq!(cache.get_at("a", t0 + MINUTE), Some(&json!(3)));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        // Arrange
        let mut cache = ResponseCache::new(10 * MINUTE, 10);
        let t0 = Instant::now();
        cache.insert_at(String::from("old"), json!("old"), t0);
        cache.insert_at(String::from("recent"), json!("recent"), t0 + 9 * MINUTE);
        let now = t0 + 11 * MINUTE;

        // Act
        let removed = cache.sweep_at(now);

        // Assert
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains_key("old"));
        assert_eq!(cache.get_at("recent", now), Some(&json!("recent")));
    }

    #[test]
    fn test_sweep_keeps_order_consistent() {
        // Arrange
        let mut cache = ResponseCache::new(10 * MINUTE, 2);
        let t0 = Instant::now();
        cache.insert_at(String::from("old"), json!(0), t0);
        cache.insert_at(String::from("b"), json!(1), t0 + 5 * MINUTE);
        cache.sweep_at(t0 + 11 * MINUTE);

        // Act
        cache.insert_at(String::from("c"), json!(2), t0 + 11 * MINUTE);

        // Assert: no phantom key left in the order queue
        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key("b"));
        assert!(cache.contains_key("c"));
    }

    #[test]
    fn test_clear() {
        // Arrange
        let mut cache = ResponseCache::default();
        cache.insert(String::from("k"), json!(null));

        // Act
        cache.clear();

        // Assert
        assert!(cache.is_empty());
    }
}
