//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, lazy expirations and store evictions.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of a cache's activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that returned a value
    pub hits: u64,
    /// Number of lookups that returned nothing (absent or expired)
    pub misses: u64,
    /// Number of entries dropped because a lookup found them expired
    pub expirations: u64,
    /// Number of entries the bounded store evicted on its own
    pub evictions: u64,
    /// Current number of live keys
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Records a lookup that returned a value.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a lookup that found nothing.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts an expired entry found by a lookup. The lookup is also a miss.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }
}
