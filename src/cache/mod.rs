//! Cache Module
//!
//! In-memory caching with lazy TTL expiration over a bounded store whose
//! evictions are tracked through notifications.

mod bounded;
mod entry;
mod stats;
mod store;
mod tracker;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use bounded::{BoundedStore, EvictionListener, LruStore};
pub use entry::ExpiringEntry;
pub use stats::CacheStats;
pub use store::BoundedTtlCache;
pub use tracker::KeyTracker;
