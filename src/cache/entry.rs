//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::expiration_after;

// == Expiring Entry ==
/// A value stored together with its key and the instant it stops being valid.
///
/// The key travels with the entry so an eviction listener that only sees the
/// evicted value can still report which key left the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringEntry<K, V> {
    /// The key this entry was stored under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
    /// Insertion generation, distinguishes this entry from earlier ones under the same key
    #[serde(default)]
    pub generation: u64,
}

impl<K, V> ExpiringEntry<K, V> {
    // == Constructor ==
    /// Creates an entry that expires `lifetime` after `now`.
    ///
    /// # Arguments
    /// * `key` - The key the entry belongs to
    /// * `value` - The value to store
    /// * `now` - The current instant according to the cache clock
    /// * `lifetime` - Optional lifetime, None = never expires
    pub fn new(key: K, value: V, now: DateTime<Utc>, lifetime: Option<Duration>) -> Self {
        Self {
            key,
            value,
            expires_at: lifetime.and_then(|lifetime| expiration_after(now, lifetime)),
            generation: 0,
        }
    }

    /// Tags the entry with the insertion generation handed out by the key tracker.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired when `now` is greater than or
    /// equal to the expiration instant, so once the lifetime has fully elapsed
    /// the entry is gone.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime at `now`, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|expires| (expires - now).to_std().unwrap_or(Duration::ZERO))
    }
}
