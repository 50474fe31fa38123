//! TTL-bounded cache for read-only query results.
//!
//! Each distinct key is an independent entry: a result stored for one key is
//! never returned for another. Entries older than the TTL are treated as
//! absent and removed lazily by [`QueryCache::purge_expired`].

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

pub struct QueryCache<K, V> {
    entries: RwLock<HashMap<K, CachedResult<V>>>,
    ttl: Duration,
}

struct CachedResult<V> {
    value: V,
    fetched_at: Instant,
}

impl<V> CachedResult<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// A zero TTL disables caching entirely.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh result for `key`, if any.
    pub async fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let guard = self.entries.read().await;
        guard
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Record a successful result, replacing any previous one for `key`.
    pub async fn store(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let entry = CachedResult {
            value,
            fetched_at: Instant::now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Store a value with an explicit fetch time (tests only).
    #[cfg(test)]
    pub async fn store_at(&self, key: K, value: V, fetched_at: Instant) {
        let entry = CachedResult { value, fetched_at };
        self.entries.write().await.insert(key, entry);
    }

    /// Drop the entry for `key`; returns whether one existed.
    pub async fn invalidate(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every entry; returns how many were removed.
    pub async fn invalidate_all(&self) -> usize {
        let mut guard = self.entries.write().await;
        let removed = guard.len();
        guard.clear();
        removed
    }

    /// Remove stale entries; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.entries.write().await;
        let before = guard.len();
        guard.retain(|_, entry| entry.is_fresh(self.ttl));
        before - guard.len()
    }

    /// Entry count, including stale entries not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
