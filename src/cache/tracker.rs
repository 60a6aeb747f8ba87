//! Key Tracker Module
//!
//! Maintains the authoritative set of live keys for a bounded TTL cache,
//! kept in sync with the bounded store through eviction notifications.
//!
//! Every tracked key remembers the generation of the entry that put it there.
//! An eviction notice only removes a key when its generation still matches,
//! so a late notice about a replaced entry cannot drop the live key.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{EvictionListener, ExpiringEntry};

// == Key Tracker ==
/// The set of keys currently present in the bounded store.
#[derive(Debug)]
pub struct KeyTracker<K> {
    /// Keys believed live in the store, with the generation of their entry
    live_keys: Mutex<HashMap<K, u64>>,
    /// Last generation handed out
    generations: AtomicU64,
    /// Evictions reported by the store
    evictions: AtomicU64,
}

impl<K> KeyTracker<K>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            live_keys: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    // == Next Generation ==
    /// Hands out a fresh generation for an entry about to be stored.
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    // == Add ==
    /// Starts tracking `key` as held by the entry of `generation`.
    pub fn add(&self, key: K, generation: u64) {
        self.live_keys.lock().insert(key, generation);
    }

    // == Remove ==
    /// Stops tracking `key`. Removing an absent key is a no-op.
    pub fn remove(&self, key: &K) {
        self.live_keys.lock().remove(key);
    }

    // == Contains ==
    /// Returns true if `key` is currently tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.live_keys.lock().contains_key(key)
    }

    // == All Keys ==
    /// Returns a copy of every tracked key.
    pub fn all_keys(&self) -> HashSet<K> {
        self.live_keys.lock().keys().cloned().collect()
    }

    // == Len ==
    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.live_keys.lock().len()
    }

    /// Returns true if no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.live_keys.lock().is_empty()
    }

    // == Clear ==
    /// Forgets every key.
    pub fn clear(&self) {
        self.live_keys.lock().clear();
    }

    /// Number of eviction notifications that removed a key.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

impl<K> Default for KeyTracker<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// == Eviction Handling ==
impl<K, V> EvictionListener<ExpiringEntry<K, V>> for KeyTracker<K>
where
    K: Eq + Hash + Clone + Send,
{
    fn on_evicted(&self, entry: &ExpiringEntry<K, V>) {
        let mut live_keys = self.live_keys.lock();
        match live_keys.get(&entry.key) {
            Some(&generation) if generation == entry.generation => {
                live_keys.remove(&entry.key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Key tracker dropped evicted key");
            }
            Some(_) => debug!("Ignoring eviction of a replaced entry"),
            None => {}
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(key: &str, generation: u64) -> ExpiringEntry<String, u32> {
        ExpiringEntry::new(key.to_string(), 0, Utc::now(), None).with_generation(generation)
    }

    #[test]
    fn test_tracker_new() {
        let tracker: KeyTracker<String> = KeyTracker::new();
        assert!(tracker.is_empty());
        assert_eq!(tracker.len(), 0);
        assert_eq!(tracker.evictions(), 0);
    }

    #[test]
    fn test_tracker_add_and_remove() {
        let tracker = KeyTracker::new();

        tracker.add("key1".to_string(), 1);
        tracker.add("key2".to_string(), 2);
        tracker.add("key1".to_string(), 3);
        assert_eq!(tracker.len(), 2);

        tracker.remove(&"key1".to_string());
        assert!(!tracker.contains(&"key1".to_string()));
        assert!(tracker.contains(&"key2".to_string()));
    }

    #[test]
    fn test_tracker_remove_nonexistent_key() {
        let tracker = KeyTracker::new();
        tracker.add("key1".to_string(), 1);

        tracker.remove(&"nonexistent".to_string());

        assert_eq!(tracker.all_keys(), HashSet::from(["key1".to_string()]));
    }

    #[test]
    fn test_tracker_on_evicted_is_idempotent() {
        let tracker = KeyTracker::new();
        tracker.add("key1".to_string(), 1);

        tracker.on_evicted(&entry("key1", 1));
        tracker.on_evicted(&entry("key1", 1));
        tracker.on_evicted(&entry("never-added", 1));

        assert!(tracker.is_empty());
        assert_eq!(tracker.evictions(), 1);
    }

    #[test]
    fn test_tracker_ignores_eviction_of_replaced_entry() {
        let tracker = KeyTracker::new();
        let first = tracker.next_generation();
        tracker.add("key1".to_string(), first);
        let second = tracker.next_generation();
        tracker.add("key1".to_string(), second);

        tracker.on_evicted(&entry("key1", first));

        assert!(tracker.contains(&"key1".to_string()));
        assert_eq!(tracker.evictions(), 0);

        tracker.on_evicted(&entry("key1", second));
        assert!(tracker.is_empty());
        assert_eq!(tracker.evictions(), 1);
    }

    #[test]
    fn test_tracker_generations_increase() {
        let tracker: KeyTracker<String> = KeyTracker::new();
        let first = tracker.next_generation();
        let second = tracker.next_generation();
        assert!(second > first);
    }

    #[test]
    fn test_tracker_clear() {
        let tracker = KeyTracker::new();
        tracker.add(1, 1);
        tracker.add(2, 2);

        tracker.clear();

        assert!(tracker.is_empty());
    }
}
