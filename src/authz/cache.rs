//! In-process TTL cache for authorization lookups.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A shared key-value cache. Values are returned by clone.
pub trait Cache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn put(&self, key: K, value: V);
    fn invalidate(&self, key: &K);
    fn clear(&self);
}

/// Cache whose entries expire a fixed duration after they were written.
///
/// Expired entries are dropped when read, and swept whenever a write happens,
/// so no background task is needed. With the small key sets this serves, the
/// sweep on write stays cheap.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, (V, Instant)>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up a key as of the given instant.
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((value, written)) if now.duration_since(*written) < self.ttl => {
                Some(value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a key as of the given instant, sweeping expired entries.
    pub fn put_at(&self, key: K, value: V, now: Instant) {
        let ttl = self.ttl;
        let mut entries = self.lock();
        entries.retain(|_, (_, written)| now.duration_since(*written) < ttl);
        entries.insert(key, (value, now));
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<K: Eq + Hash + Send, V: Clone + Send> Cache<K, V> for TtlCache<K, V> {
    fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn put(&self, key: K, value: V) {
        self.put_at(key, value, Instant::now())
    }

    fn invalidate(&self, key: &K) {
        self.lock().remove(key);
    }

    fn clear(&self) {
        self.lock().clear();
    }
}
