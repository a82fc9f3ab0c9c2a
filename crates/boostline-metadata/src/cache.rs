//! Time-to-live cache keyed by video reference.
//!
//! Entries expire a fixed duration after insertion regardless of how often
//! they are read. Expired entries are dropped lazily when read; nothing else
//! evicts, so the map grows with the number of distinct keys seen.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value unless it is at least `ttl` old.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        self.put_at(key, value, Instant::now());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.inserted_at) < self.ttl)?;
        if fresh {
            entries.get(key).map(|entry| entry.value.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    fn put_at(&self, key: impl Into<String>, value: V, now: Instant) {
        self.lock().insert(
            key.into(),
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still safe to use.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
