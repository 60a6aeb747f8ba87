//! Bounded Store Module
//!
//! The capacity-limited map the TTL cache stores its entries in, plus a
//! default implementation that evicts the least recently used entry.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

// == Eviction Listener ==
/// Receives values a bounded store drops on its own, e.g. under capacity pressure.
///
/// Implementations must tolerate being told about a value more than once or
/// about a value whose key they no longer track.
pub trait EvictionListener<V>: Send + Sync {
    /// Called with the value the store is about to drop.
    fn on_evicted(&self, value: &V);
}

// == Bounded Store ==
/// A capacity-limited associative store that may evict entries autonomously.
pub trait BoundedStore<K, V>: Send {
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: K, value: V);

    /// Looks up `key`, counting as a use for the eviction policy.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Looks up `key` without affecting the eviction policy.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Removes `key`, returning its value if present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes every entry.
    fn remove_all(&mut self);

    /// Number of entries physically held.
    fn len(&self) -> usize;

    /// Returns true if the store holds nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The capacity this store was configured with, 0 = unlimited.
    fn count_limit(&self) -> usize;

    /// Registers the listener notified about autonomous evictions.
    fn set_eviction_listener(&mut self, listener: Arc<dyn EvictionListener<V>>);
}

// == LRU Store ==
/// Default bounded store: evicts the least recently used entry on overflow.
///
/// Keys are ordered in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
pub struct LruStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, V>,
    /// Order of keys by access time
    order: VecDeque<K>,
    /// Maximum number of entries, 0 = unlimited
    count_limit: usize,
    /// Notified when an entry is evicted for capacity
    listener: Option<Arc<dyn EvictionListener<V>>>,
}

impl<K, V> LruStore<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty store holding at most `count_limit` entries (0 = unlimited).
    pub fn new(count_limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            count_limit,
            listener: None,
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    fn touch(&mut self, key: &K) {
        self.forget(key);
        self.order.push_front(key.clone());
    }

    fn forget(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Drops the least recently used entry and tells the listener about it.
    fn evict_oldest(&mut self) {
        let Some(oldest) = self.order.pop_back() else {
            return;
        };
        if let Some(value) = self.entries.remove(&oldest) {
            debug!("Bounded store evicting least recently used entry");
            if let Some(listener) = &self.listener {
                listener.on_evicted(&value);
            }
        }
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.order.back()
    }
}

impl<K, V> BoundedStore<K, V> for LruStore<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Send,
{
    fn set(&mut self, key: K, value: V) {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.count_limit > 0 {
            while self.entries.len() >= self.count_limit && !self.order.is_empty() {
                self.evict_oldest();
            }
        }

        self.touch(&key);
        self.entries.insert(key, value);
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.entries.contains_key(key) {
            self.touch(key);
        }
        self.entries.get(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.forget(key);
        self.entries.remove(key)
    }

    fn remove_all(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn count_limit(&self) -> usize {
        self.count_limit
    }

    fn set_eviction_listener(&mut self, listener: Arc<dyn EvictionListener<V>>) {
        self.listener = Some(listener);
    }
}

impl<K, V> fmt::Debug for LruStore<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("order", &self.order)
            .field("count_limit", &self.count_limit)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
