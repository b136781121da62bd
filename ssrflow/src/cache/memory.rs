//! In-memory cache store.

use super::{CacheEntry, CacheStore};
use crate::errors::CacheError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Cap on entry lifetime; longer TTLs are clamped to it.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

struct StoredEntry {
    entry: CacheEntry,
    expires_at: Instant,
    seq: u64,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded, TTL-aware cache store backed by a concurrent map.
///
/// Expired entries are dropped lazily on read and by [`purge_expired`].
/// When full, inserting a new key evicts expired entries first and then the
/// oldest insertion.
///
/// [`purge_expired`]: InMemoryCacheStore::purge_expired
pub struct InMemoryCacheStore {
    entries: DashMap<String, StoredEntry>,
    max_entries: usize,
    next_seq: AtomicU64,
}

impl InMemoryCacheStore {
    /// Creates a store holding at most `max_entries` entries.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Returns the number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, stored| !stored.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes `key` only if the stored entry is still expired, so a
    /// concurrent `set` between the read and the removal survives.
    fn remove_if_expired(&self, key: &str, now: Instant) -> bool {
        self.entries
            .remove_if(key, |_, stored| stored.is_expired(now))
            .is_some()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|item| item.value().seq)
            .map(|item| item.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            tracing::trace!(key = %key, "Evicted oldest cache entry");
        }
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now = Instant::now();
        if let Some(stored) = self.entries.get(key) {
            if !stored.is_expired(now) {
                return Ok(Some(stored.entry.clone()));
            }
            drop(stored);
            self.remove_if_expired(key, now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        let now = Instant::now();
        let stored = StoredEntry {
            entry,
            expires_at: now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        self.entries.insert(key.to_string(), stored);
        Ok(())
    }
}
