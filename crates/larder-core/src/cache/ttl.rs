//! Time-based in-memory key/value store.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// A cached value and the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    /// An entry is valid while `now - stored_at < ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// In-memory cache with a single TTL for every entry.
///
/// Reads never extend an entry's life. Stale entries are not swept in the
/// background; they are dropped the next time they are read. The lock is
/// only held for the map operation itself, never across an `.await`, so the
/// cache can be shared between screens behind an `Arc`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, or `None` on a miss or an expired entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite `key`, stamping it with the current time.
    pub fn set(&self, key: K, value: V) {
        self.entries().insert(key, CacheEntry::new(value));
    }

    /// Remove `key`. Keys that were never inserted are ignored.
    pub fn invalidate(&self, key: &K) {
        self.entries().remove(key);
    }

    pub fn invalidate_all(&self) {
        self.entries().clear();
    }

    /// Remove every key matching `predicate`, returning how many were dropped.
    pub fn invalidate_where(&self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// Age of a fresh entry. Expired entries report `None` but are left in
    /// place for the next `get` to drop.
    pub fn age(&self, key: &K) -> Option<Duration> {
        self.entries()
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(CacheEntry::age)
    }

    /// Number of entries held, including stale ones not yet read.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // No operation can panic halfway through a map update, so a poisoned
        // map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
