//! Capacity-bounded LRU cache with optional absolute expiry.
//!
//! Eviction happens only through LRU pressure or [`BoundedCache::invalidate`].
//! An entry whose TTL has lapsed stays in the map until one of those removes
//! it, but lookups refuse to return it.
//!
//! ### Locking
//! One `Mutex` guards each cache, and reads take it too: an LRU read moves the
//! entry to the front, so a read/write lock would not let readers proceed in
//! parallel. Every critical section is a single O(1) map operation plus a
//! clone, nothing is awaited while the lock is held, and the preview and image
//! caches lock independently. Splitting the map into shards would reduce
//! contention but change eviction from global LRU to per-shard LRU.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::stats::{CacheStats, CacheStatsSnapshot};

/// Cached value plus its expiry deadline, if any.
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Thread-safe bounded cache.
///
/// The lock is held only for O(1) map operations, never across I/O.
#[derive(Debug)]
pub struct BoundedCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Option<Duration>,
    stats: CacheStats,
}

impl<V: Clone> BoundedCache<V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self { entries: Mutex::new(LruCache::new(capacity)), ttl, stats: CacheStats::default() }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a key, counting a hit or miss and refreshing its recency.
    ///
    /// Expired entries count as misses and are not promoted.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();

        let fresh = entries.peek(key).is_some_and(|entry| !entry.is_expired(now));
        if !fresh {
            drop(entries);
            self.stats.record_miss();
            return None;
        }

        let value = entries.get(key).map(|entry| entry.value.clone());
        drop(entries);
        self.stats.record_hit();
        value
    }

    /// Insert or replace a value, evicting the least recently used entry on overflow.
    pub fn insert(&self, key: String, value: V) {
        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        let evicted = self.lock().push(key.clone(), CacheEntry { value, expires_at });

        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            tracing::debug!(key = %evicted_key, "evicted least recently used entry");
        }
    }

    /// Remove a key. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().pop(key).is_some()
    }

    /// Fresh value for `key`, without touching recency or counters.
    pub fn peek(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.lock().peek(key).filter(|entry| !entry.is_expired(now)).map(|entry| entry.value.clone())
    }

    /// Whether a fresh entry exists, without touching recency or counters.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock().peek(key).is_some_and(|entry| !entry.is_expired(now))
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
