//! Freeze-dried caches
//!
//! A `FreezeDried` snapshot is the live, unexpired contents of a cache as a
//! flat key to value map with no expiration metadata. Thawing re-inserts every
//! entry, so each one gets a lifetime measured from the moment of thawing.

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{BoundedStore, BoundedTtlCache, ExpiringEntry};
use crate::clock::Clock;
use crate::error::Result;
use crate::persist::location::{read_error, unwritable, CacheLocation};

// == Freeze Dried ==
/// Snapshot of a cache's live contents.
///
/// Entries are encoded as a list of `[key, value]` pairs, so any serializable
/// key survives a round trip, not only strings and integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Deserialize<'de> + Eq + Hash, V: Deserialize<'de>"
))]
pub struct FreezeDried<K: Eq + Hash, V> {
    #[serde(with = "entry_pairs")]
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> FreezeDried<K, V> {
    /// Creates a snapshot with no entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Wraps an existing key to value map.
    pub fn from_entries(entries: HashMap<K, V>) -> Self {
        Self { entries }
    }

    /// The snapshotted pairs.
    pub fn entries(&self) -> &HashMap<K, V> {
        &self.entries
    }

    /// Consumes the snapshot, returning its pairs.
    pub fn into_entries(self) -> HashMap<K, V> {
        self.entries
    }

    /// Number of snapshotted pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serde adapter writing a map as a sequence of `(key, value)` tuples.
mod entry_pairs {
    use std::collections::HashMap;
    use std::hash::Hash;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(entries: &HashMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(entries.iter())
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<HashMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Eq + Hash,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(K, V)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

impl<K, V> FreezeDried<K, V>
where
    K: Eq + Hash + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    // == Encoding ==
    /// Encodes the snapshot as JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a snapshot produced by `to_json`.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    // == Save To File ==
    /// Writes the snapshot to `<base>[/<group>]/<name>.cache`, creating
    /// directories as needed, and returns the path written.
    pub fn save_to_file(
        &self,
        name: &str,
        group: Option<&str>,
        location: &CacheLocation,
    ) -> Result<PathBuf> {
        let path = location.require_path(name, group)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| unwritable(name, group))?;
        }

        fs::write(&path, self.to_json()?)?;
        info!("Saved {} cache entries to {}", self.len(), path.display());
        Ok(path)
    }

    // == Read From File ==
    /// Reads the snapshot written by `save_to_file` for the same name and group.
    pub fn read_from_file(
        name: &str,
        group: Option<&str>,
        location: &CacheLocation,
    ) -> Result<Self> {
        let path = location.require_path(name, group)?;
        let bytes = fs::read(&path).map_err(|err| read_error(path.clone(), err))?;
        let snapshot = Self::from_json(&bytes)?;
        debug!("Read {} cache entries from {}", snapshot.len(), path.display());
        Ok(snapshot)
    }
}

// == Cache Conversions ==
impl<K, V, S> BoundedTtlCache<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    S: BoundedStore<K, ExpiringEntry<K, V>>,
{
    // == Freeze Dry ==
    /// Snapshots the live contents.
    ///
    /// Each key from the live set is read again, so a key that expires
    /// between listing and reading is left out. Snapshotting does not count
    /// as use: stats and eviction order are unchanged.
    pub fn freeze_dry(&self) -> FreezeDried<K, V> {
        let entries = self
            .keys()
            .into_iter()
            .filter_map(|key| self.peek_live(&key).map(|value| (key, value)))
            .collect();
        FreezeDried { entries }
    }
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    // == Reconstruct ==
    /// Builds a new cache holding every snapshot entry, each with a lifetime
    /// starting now.
    pub fn reconstruct(
        snapshot: FreezeDried<K, V>,
        clock: Arc<dyn Clock>,
        entry_lifetime: Option<Duration>,
        count_limit: usize,
    ) -> Self {
        let cache = Self::new(clock, entry_lifetime, count_limit);
        for (key, value) in snapshot.entries {
            cache.insert(key, value);
        }
        cache
    }
}

impl<K, V, S> From<&BoundedTtlCache<K, V, S>> for FreezeDried<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    S: BoundedStore<K, ExpiringEntry<K, V>>,
{
    fn from(cache: &BoundedTtlCache<K, V, S>) -> Self {
        cache.freeze_dry()
    }
}
