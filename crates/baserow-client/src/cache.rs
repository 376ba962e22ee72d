//! Query result cache with per-entry TTL.
//!
//! `Table::select` can reuse a previously fetched page when the caller passes
//! a freshness window. Entries are keyed by base id, table id and the sorted
//! query parameters (see [`cache_key`]).
//!
//! # Staleness Behavior
//!
//! The cache is read-through only. Creating, updating or deleting rows does
//! not touch it, so a cached page can be stale for up to its TTL. Call
//! `BaserowClient::clear_cache()` when a read must observe a prior write.
//!
//! # Expiry
//!
//! Every entry remembers the TTL it was stored with. Each cached lookup first
//! sweeps entries whose age has reached their own TTL, then serves a hit only
//! if the remaining entry is younger than the caller's window. The cache is
//! unbounded; the sweep is the only eviction.

use crate::types::RowList;
use lru::LruCache;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Storage for `select` results.
///
/// Implementations must be shareable across tasks. Inject one with
/// `BaserowClient::with_cache`.
pub trait QueryCache: Send + Sync {
    /// Return the entry for `key` if it is younger than `max_age`.
    fn get(&self, key: &str, max_age: Duration) -> Option<RowList>;

    /// Store `value` under `key`; it expires once older than `ttl`.
    fn put(&self, key: String, value: RowList, ttl: Duration);

    /// Drop every entry whose age has reached its own TTL. Returns how many
    /// entries were removed.
    fn evict_expired(&self) -> usize;

    /// Drop every entry.
    fn clear(&self);

    /// Number of stored entries, expired ones included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the cache key for a query against one table.
pub fn cache_key(base_id: i64, table_id: &str, params: &BTreeMap<String, String>) -> String {
    let signature = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("select:{}:{}:{}", base_id, table_id, signature)
}

/// Cached entry with timestamp for TTL-based expiration.
#[derive(Debug, Clone)]
struct CachedEntry<T> {
    value: T,
    cached_at: Instant,
    ttl: Duration,
}

impl<T> CachedEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }

    fn is_fresh_for(&self, max_age: Duration) -> bool {
        self.cached_at.elapsed() < max_age
    }
}

/// Unbounded in-memory cache, the default for every client.
pub struct MemoryQueryCache {
    entries: Mutex<LruCache<String, CachedEntry<RowList>>>,
}

impl MemoryQueryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CachedEntry<RowList>>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let cache = self.lock();
        let expired = cache.iter().filter(|(_, e)| e.is_expired()).count();
        CacheStats {
            entries: cache.len(),
            expired,
        }
    }
}

impl Default for MemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache for MemoryQueryCache {
    fn get(&self, key: &str, max_age: Duration) -> Option<RowList> {
        let cache = self.lock();
        if let Some(entry) = cache.peek(key) {
            if entry.is_fresh_for(max_age) {
                tracing::debug!(key = %key, "Cache hit");
                return Some(entry.value.clone());
            }
            tracing::debug!(key = %key, "Cache entry too old for requested window");
        }
        None
    }

    fn put(&self, key: String, value: RowList, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let mut cache = self.lock();
        tracing::debug!(key = %key, rows = value.len(), ttl_ms = %ttl.as_millis(), "Cached page");
        cache.put(key, CachedEntry::new(value, ttl));
    }

    fn evict_expired(&self) -> usize {
        let mut cache = self.lock();
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            cache.pop(key);
            tracing::debug!(key = %key, "Cache entry expired");
        }
        expired.len()
    }

    fn clear(&self) {
        self.lock().clear();
        tracing::debug!("Query cache cleared");
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Cache that stores nothing. Every `select` reaches the server.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopQueryCache;

impl QueryCache for NoopQueryCache {
    fn get(&self, _key: &str, _max_age: Duration) -> Option<RowList> {
        None
    }

    fn put(&self, _key: String, _value: RowList, _ttl: Duration) {}

    fn evict_expired(&self) -> usize {
        0
    }

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries in cache
    pub entries: usize,
    /// Number of expired entries (not yet swept)
    pub expired: usize,
}
