//! TTL- and capacity-bounded response cache
//!
//! One instance per cached operation. Expired entries are dropped lazily when
//! read; at capacity, inserting a new key evicts the entry inserted earliest
//! (insertion order, not last access).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Tie-breaker for entries inserted at the same instant
    seq: u64,
}

#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    next_seq: u64,
}

/// Key → value cache with time-to-live and capacity bounds
#[derive(Debug)]
pub struct ResponseCache<K, V> {
    name: &'static str,
    capacity: usize,
    ttl: Duration,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// `name` only labels log lines
    pub fn new(name: &'static str, capacity: usize, ttl: Duration) -> Self {
        Self {
            name,
            capacity,
            ttl,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut state = self.lock();

        let expired = match state.entries.get(key) {
            None => {
                tracing::debug!(cache = self.name, "Cache miss");
                return None;
            }
            Some(entry) => now.saturating_duration_since(entry.inserted_at) > self.ttl,
        };

        if expired {
            state.entries.remove(key);
            tracing::debug!(cache = self.name, "Cache entry expired");
            return None;
        }

        tracing::debug!(cache = self.name, "Cache hit");
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: K, value: V) {
        self.put_at(key, value, Instant::now());
    }

    pub fn put_at(&self, key: K, value: V, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        let mut state = self.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.inserted_at, entry.seq))
                .map(|(k, _)| k.clone());

            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                tracing::debug!(cache = self.name, "Evicted oldest cache entry");
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                seq,
            },
        );
    }

    /// Number of stored entries, expired ones included until they are read
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
        tracing::debug!(cache = self.name, "Cache cleared");
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
