//! Result Caches
//!
//! `TtlCache` backs every API lookup (weather, crypto, location, media)
//! and `MessageCache` holds generated responses. Each instance owns its
//! storage behind a single mutex, so a read-check-evict-insert sequence is
//! atomic per cache.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-insert cannot leave the maps in a state worse than a miss.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A cached value with its insertion time and lifetime
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    /// An entry is valid iff `now - inserted_at < ttl`
    pub fn is_valid(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// Unbounded expiring key-value store; every entry carries its own TTL
#[derive(Debug)]
pub struct TtlCache<V> {
    name: &'static str,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        debug!("📦 [{}] caching '{}' for {:?}", self.name, key, ttl);
        lock(&self.entries).insert(key, CacheEntry::new(value, ttl));
    }

    /// Return the value if still valid; an expired entry is evicted
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(entry) if entry.is_valid() => {
                debug!("📦 [{}] hit '{}'", self.name, key);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("📦 [{}] expired '{}'", self.name, key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        lock(&self.entries)
            .get(key)
            .is_some_and(CacheEntry::is_valid)
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

#[derive(Debug, Default)]
struct MessageStore {
    values: HashMap<String, String>,
    order: VecDeque<String>,
}

/// Bounded prompt -> response map with strict FIFO eviction and no expiry
///
/// Keys are lowercased on every operation.
#[derive(Debug)]
pub struct MessageCache {
    capacity: usize,
    store: Mutex<MessageStore>,
}

impl MessageCache {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            store: Mutex::new(MessageStore::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert a response, evicting the oldest-inserted key when full
    ///
    /// The size check runs before every insert, including an overwrite of a
    /// key that is already present. An overwritten key that survives the
    /// eviction keeps its position.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let key = key.to_lowercase();
        let value = value.into();
        let mut store = lock(&self.store);

        if store.values.len() >= self.capacity {
            if let Some(oldest) = store.order.pop_front() {
                debug!("📦 [messages] evicting oldest '{}'", oldest);
                store.values.remove(&oldest);
            }
        }

        if let Some(existing) = store.values.get_mut(&key) {
            *existing = value;
            return;
        }

        store.order.push_back(key.clone());
        store.values.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.store).values.get(&key.to_lowercase()).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        lock(&self.store).values.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        lock(&self.store).values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut store = lock(&self.store);
        store.values.clear();
        store.order.clear();
    }
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
