//! Cache Store Module
//!
//! In-memory cache combining a bounded store, a key tracker fed by the store's
//! eviction notifications, and lazy TTL expiration against an injected clock.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{BoundedStore, CacheStats, ExpiringEntry, KeyTracker, LruStore};
use crate::caching::Caching;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;

/// Store and counters guarded together so every mutation is serialized.
struct Inner<S> {
    store: S,
    stats: CacheStats,
}

// == Bounded TTL Cache ==
/// In-memory cache with lazily enforced entry lifetimes.
///
/// `keys`, `count` and `is_empty` come from the key tracker rather than the
/// store, because the store can still hold expired entries nobody has read yet.
pub struct BoundedTtlCache<K, V, S = LruStore<K, ExpiringEntry<K, V>>> {
    inner: Mutex<Inner<S>>,
    tracker: Arc<KeyTracker<K>>,
    clock: Arc<dyn Clock>,
    entry_lifetime: Option<Duration>,
    _value: PhantomData<fn() -> V>,
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache over the default LRU store.
    ///
    /// # Arguments
    /// * `clock` - Time source used for every expiration decision
    /// * `entry_lifetime` - Lifetime of each entry, None = never expires
    /// * `count_limit` - Capacity handed to the store, 0 = unlimited
    pub fn new(clock: Arc<dyn Clock>, entry_lifetime: Option<Duration>, count_limit: usize) -> Self {
        Self::with_store(LruStore::new(count_limit), clock, entry_lifetime)
    }

    /// Creates a cache on the system clock from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            Arc::new(SystemClock),
            config.entry_lifetime,
            config.count_limit,
        )
    }
}

impl<K, V, S> BoundedTtlCache<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    S: BoundedStore<K, ExpiringEntry<K, V>>,
{
    /// Creates a cache over any bounded store, registering the key tracker
    /// as the store's eviction listener.
    pub fn with_store(mut store: S, clock: Arc<dyn Clock>, entry_lifetime: Option<Duration>) -> Self {
        let tracker = Arc::new(KeyTracker::new());
        store.set_eviction_listener(tracker.clone());

        Self {
            inner: Mutex::new(Inner {
                store,
                stats: CacheStats::new(),
            }),
            tracker,
            clock,
            entry_lifetime,
            _value: PhantomData,
        }
    }

    // == Insert ==
    /// Stores `value` under `key`, resetting its expiration.
    ///
    /// Never fails. If the store is at capacity it may evict a different key,
    /// which reaches the tracker through the eviction listener. The entry is
    /// tagged with a fresh generation so late notices about the entry it
    /// replaces are ignored.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        let generation = self.tracker.next_generation();
        let entry = ExpiringEntry::new(key.clone(), value, self.clock.now(), self.entry_lifetime)
            .with_generation(generation);
        inner.store.set(key.clone(), entry);
        self.tracker.add(key, generation);
    }

    // == Value ==
    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed from the store and the tracker before
    /// returning None; there is no other expiration path.
    pub fn value(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = self.clock.now();

        match inner.store.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                return Some(value);
            }
            Some(_) => {}
            None => {
                inner.stats.record_miss();
                return None;
            }
        }

        debug!("Dropping expired cache entry on access");
        inner.store.remove(key);
        self.tracker.remove(key);
        inner.stats.record_expiration();
        None
    }

    // == Remove Value ==
    /// Removes `key` from store and tracker. No-op if absent.
    pub fn remove_value(&self, key: &K) {
        let mut inner = self.inner.lock();
        inner.store.remove(key);
        self.tracker.remove(key);
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.store.remove_all();
        self.tracker.clear();
        debug!("Cache cleared");
    }

    /// Indexed write: `Some` inserts, `None` removes.
    pub fn assign(&self, key: K, value: Option<V>) {
        match value {
            Some(value) => self.insert(key, value),
            None => self.remove_value(&key),
        }
    }

    // == Keys ==
    /// Returns the live key set.
    pub fn keys(&self) -> HashSet<K> {
        self.tracker.all_keys()
    }

    // == Count ==
    /// Number of live keys.
    pub fn count(&self) -> usize {
        self.tracker.len()
    }

    /// Returns true if no key is live.
    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Capacity passed to the bounded store. Not enforced by the cache itself.
    pub fn count_limit(&self) -> usize {
        self.inner.lock().store.count_limit()
    }

    /// Lifetime given to each inserted entry, None = never expires.
    pub fn entry_lifetime(&self) -> Option<Duration> {
        self.entry_lifetime
    }

    /// The clock every expiration decision is made against.
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.inner.lock().stats.clone();
        stats.evictions = self.tracker.evictions();
        stats.total_entries = self.tracker.len();
        stats
    }

    /// Reads `key` if present and unexpired without touching stats, the
    /// eviction order, or expired entries.
    pub(crate) fn peek_live(&self, key: &K) -> Option<V> {
        let inner = self.inner.lock();
        let now = self.clock.now();
        inner
            .store
            .peek(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone())
    }

    /// Runs `f` against the underlying store while holding the cache lock.
    pub(crate) fn with_store_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.lock().store)
    }
}

impl<K, V, S> Caching for BoundedTtlCache<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    S: BoundedStore<K, ExpiringEntry<K, V>>,
{
    type Key = K;
    type Value = V;

    fn insert(&self, key: K, value: V) {
        BoundedTtlCache::insert(self, key, value)
    }

    fn value(&self, key: &K) -> Option<V> {
        BoundedTtlCache::value(self, key)
    }

    fn remove_value(&self, key: &K) {
        BoundedTtlCache::remove_value(self, key)
    }

    fn clear(&self) {
        BoundedTtlCache::clear(self)
    }

    fn count(&self) -> usize {
        BoundedTtlCache::count(self)
    }

    fn is_empty(&self) -> bool {
        BoundedTtlCache::is_empty(self)
    }
}

impl<K, V, S> fmt::Debug for BoundedTtlCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedTtlCache")
            .field("entry_lifetime", &self.entry_lifetime)
            .finish_non_exhaustive()
    }
}
