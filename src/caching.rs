//! Caching Trait
//!
//! The surface shared by the in-memory and file-system-backed caches.

/// A key/value cache where a miss is an empty result, never an error.
pub trait Caching {
    type Key;
    type Value;

    /// Stores `value` under `key`, replacing whatever was there.
    fn insert(&self, key: Self::Key, value: Self::Value);

    /// Returns the value for `key`, or None on a miss.
    fn value(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Removes `key`. No-op if absent.
    fn remove_value(&self, key: &Self::Key);

    /// Removes everything.
    fn clear(&self);

    fn count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Indexed write: `Some` inserts, `None` removes.
    fn assign(&self, key: Self::Key, value: Option<Self::Value>) {
        match value {
            Some(value) => self.insert(key, value),
            None => self.remove_value(&key),
        }
    }
}
