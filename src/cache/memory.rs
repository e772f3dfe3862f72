//! In-memory placeholder cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::ops::compute::Op;
use moka::sync::Cache;
use serde::Deserialize;

use super::{CacheKey, Clock, PlaceholderCache, SystemClock};
use crate::types::{CacheTtl, SubjectId};
use crate::{MimirError, Result};

/// Configuration for [`MemoryPlaceholderCache`].
///
/// ```rust
/// # use mimir::cache::MemoryCacheConfig;
/// let config = MemoryCacheConfig::new().max_entries(50_000);
/// assert_eq!(config.max_entries, 50_000);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryCacheConfig {
    /// Maximum number of cached values. Default: 10,000.
    pub max_entries: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
        }
    }
}

impl MemoryCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached values.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CacheEntry {
    value: String,
    written_at: u64,
    ttl: CacheTtl,
}

/// Upper bound on moka's own expiry; logical expiry still follows the TTL.
const MAX_PHYSICAL_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Physical eviction after each entry's own TTL.
struct EntryExpiry;

impl EntryExpiry {
    fn physical(ttl: CacheTtl) -> Option<Duration> {
        Some(ttl.as_duration().min(MAX_PHYSICAL_TTL))
    }
}

impl Expiry<CacheKey, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Self::physical(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Self::physical(value.ttl)
    }
}

/// Bounded in-process cache of resolved placeholder values.
///
/// Each entry carries the TTL it was written with. Staleness is decided
/// against the injected [`Clock`] on every `get` (`now - written >= ttl`),
/// so a stale value is never returned; moka additionally evicts entries
/// in the background once their TTL has passed in wall time.
///
/// Thread-safe: moka shards its storage, so reads and writes to different
/// keys do not contend on a single lock.
pub struct MemoryPlaceholderCache {
    entries: Cache<CacheKey, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl MemoryPlaceholderCache {
    /// Create a cache on the system clock.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache that evaluates TTLs against `clock`.
    pub fn with_clock(config: &MemoryCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(EntryExpiry)
            .support_invalidation_closures()
            .build();
        Self { entries, clock }
    }

    /// Drop every entry keyed on `subject`, as primary subject, viewer or
    /// target. Global entries are kept.
    pub fn invalidate_subject(&self, subject: SubjectId) -> Result<()> {
        self.entries
            .invalidate_entries_if(move |key, _| key.mentions(subject))
            .map(|_| ())
            .map_err(|e| MimirError::Cache(e.to_string()))
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Number of entries currently held, after flushing pending evictions.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove `key` only if it still holds `seen`; a concurrent fresh write wins.
    fn evict_if_unchanged(&self, key: &CacheKey, seen: &CacheEntry) {
        self.entries
            .entry(key.clone())
            .and_compute_with(|current| match current {
                Some(current) if current.value() == seen => Op::Remove,
                _ => Op::Nop,
            });
    }
}

impl Default for MemoryPlaceholderCache {
    fn default() -> Self {
        Self::new(&MemoryCacheConfig::default())
    }
}

impl PlaceholderCache for MemoryPlaceholderCache {
    fn get(&self, key: &CacheKey) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.ttl.is_expired(entry.written_at, self.clock.now_millis()) {
            self.evict_if_unchanged(key, &entry);
            return None;
        }
        Some(entry.value)
    }

    fn put(&self, key: CacheKey, value: String, ttl: CacheTtl) {
        if ttl.is_none() {
            // An uncacheable write still supersedes whatever was there.
            self.entries.invalidate(&key);
            return;
        }
        let entry = CacheEntry {
            value,
            written_at: self.clock.now_millis(),
            ttl,
        };
        self.entries.insert(key, entry);
    }

    fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(key);
    }
}
