//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of each entry, None = entries never expire
    pub entry_lifetime: Option<Duration>,
    /// Capacity handed to the bounded store, 0 = unlimited
    pub count_limit: usize,
    /// Base directory for persisted caches, None = platform cache directory
    pub cache_root: Option<PathBuf>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENTRY_LIFETIME` - Entry lifetime in seconds (default: none, 0 = none)
    /// - `CACHE_COUNT_LIMIT` - Bounded store capacity (default: 0, unlimited)
    /// - `CACHE_ROOT` - Directory for persisted caches (default: platform cache dir)
    pub fn from_env() -> Self {
        Self {
            entry_lifetime: env::var("CACHE_ENTRY_LIFETIME")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            count_limit: env::var("CACHE_COUNT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            cache_root: env::var("CACHE_ROOT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Sets the entry lifetime.
    pub fn with_entry_lifetime(mut self, lifetime: Duration) -> Self {
        self.entry_lifetime = Some(lifetime);
        self
    }

    /// Sets the bounded store capacity.
    pub fn with_count_limit(mut self, count_limit: usize) -> Self {
        self.count_limit = count_limit;
        self
    }

    /// Sets the base directory for persisted caches.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }
}
