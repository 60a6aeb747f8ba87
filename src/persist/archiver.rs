//! Cache Archiver
//!
//! Async save/load of a whole bounded TTL cache under a logical name.

use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::info;

use crate::cache::{BoundedStore, BoundedTtlCache, ExpiringEntry};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::persist::location::{read_error, unwritable, CacheLocation};
use crate::persist::FreezeDried;

/// Persists caches as freeze-dried snapshots at `<base>[/<group>]/<name>.cache`.
#[derive(Debug, Clone)]
pub struct CacheArchiver {
    name: String,
    group: Option<String>,
    location: CacheLocation,
}

impl CacheArchiver {
    /// Creates an archiver for the cache called `name`, using the platform
    /// cache directory.
    pub fn new(name: impl Into<String>, group: Option<String>) -> Self {
        Self {
            name: name.into(),
            group,
            location: CacheLocation::system(),
        }
    }

    /// Stores snapshots under `location` instead of the platform cache directory.
    pub fn with_location(mut self, location: CacheLocation) -> Self {
        self.location = location;
        self
    }

    /// Logical name of the archived cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group the cache is stored under, if any.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Path the snapshot is written to, if one can be determined.
    pub fn path(&self) -> Option<PathBuf> {
        self.location.cache_path(&self.name, self.group())
    }

    // == Save ==
    /// Snapshots `cache` and writes it out, returning the path written.
    pub async fn save<K, V, S>(&self, cache: &BoundedTtlCache<K, V, S>) -> Result<PathBuf>
    where
        K: Eq + Hash + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
        V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
        S: BoundedStore<K, ExpiringEntry<K, V>>,
    {
        let snapshot = cache.freeze_dry();
        self.save_snapshot(&snapshot).await
    }

    /// Writes an existing snapshot, returning the path written.
    pub async fn save_snapshot<K, V>(&self, snapshot: &FreezeDried<K, V>) -> Result<PathBuf>
    where
        K: Eq + Hash + Sync + Serialize + DeserializeOwned,
        V: Sync + Serialize + DeserializeOwned,
    {
        let path = self.location.require_path(&self.name, self.group())?;
        let bytes = snapshot.to_json()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|_| unwritable(&self.name, self.group()))?;
        }
        fs::write(&path, bytes).await?;

        info!(
            "Archived {} entries of cache {} to {}",
            snapshot.len(),
            self.name,
            path.display()
        );
        Ok(path)
    }

    // == Load ==
    /// Reads the snapshot back without building a cache.
    pub async fn load_snapshot<K, V>(&self) -> Result<FreezeDried<K, V>>
    where
        K: Eq + Hash + Serialize + DeserializeOwned,
        V: Serialize + DeserializeOwned,
    {
        let path = self.location.require_path(&self.name, self.group())?;
        let bytes = fs::read(&path)
            .await
            .map_err(|err| read_error(path.clone(), err))?;
        FreezeDried::from_json(&bytes)
    }

    /// Reads the snapshot and thaws it into a new cache. Every entry gets a
    /// lifetime starting at load time.
    pub async fn load<K, V>(
        &self,
        clock: Arc<dyn Clock>,
        entry_lifetime: Option<Duration>,
        count_limit: usize,
    ) -> Result<BoundedTtlCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
        V: Clone + Send + Serialize + DeserializeOwned + 'static,
    {
        let snapshot = self.load_snapshot().await?;
        info!("Loaded {} entries of cache {}", snapshot.len(), self.name);
        Ok(BoundedTtlCache::reconstruct(
            snapshot,
            clock,
            entry_lifetime,
            count_limit,
        ))
    }

    /// Loads on the system clock with lifetime and capacity from `config`.
    pub async fn load_with_config<K, V>(&self, config: &CacheConfig) -> Result<BoundedTtlCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
        V: Clone + Send + Serialize + DeserializeOwned + 'static,
    {
        self.load::<K, V>(Arc::new(SystemClock), config.entry_lifetime, config.count_limit)
            .await
    }
}
