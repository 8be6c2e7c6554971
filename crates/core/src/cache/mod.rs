//! In-memory caches for preview records and proxied images.
//!
//! - Keys are content hashes of the canonical URL (SHA-256, hex)
//! - Capacity-bounded LRU eviction
//! - Optional absolute TTL checked on every lookup
//! - Per-cache hit/miss counters

pub mod hash;
pub mod stats;
pub mod store;

pub use hash::{KeySpace, compute_cache_key};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::BoundedCache;
