use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default lifetime of a cached dataset.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// Process-local key → (value, fetched_at) map with an explicit time-to-live.
///
/// Entries are never refreshed in the background: a stale entry is simply a miss, and
/// writers call [`invalidate`](TtlCache::invalidate) or [`clear`](TtlCache::clear).
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as of `now`; an entry is fresh while `now - fetched_at < ttl`.
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = now.saturating_duration_since(entry.fetched_at);
        if age < self.ttl {
            debug!("Cache hit ({}s old)", age.as_secs());
            Some(entry.value.clone())
        } else {
            debug!("Cache entry expired ({}s old)", age.as_secs());
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, fetched_at: Instant) {
        self.entries.insert(key, CacheEntry { value, fetched_at });
    }

    pub fn invalidate(&mut self, key: &K) {
        if self.entries.remove(key).is_some() {
            debug!("Cache entry invalidated");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
