//! File System Backed Cache
//!
//! A cache that keeps each encoded value as its own blob in a file store,
//! named by the normalized key. No key set is held in process; counts come
//! from the file store's listing. Entries do not expire.

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::caching::Caching;
use crate::error::{CacheError, Result};
use crate::file_backed::{normalized_key, CacheKey, DirectoryFileStore, FileStore};
use crate::persist::CacheLocation;

type Encoder<V> = Box<dyn Fn(&V) -> Option<Vec<u8>> + Send + Sync>;
type Decoder<V> = Box<dyn Fn(&[u8]) -> Option<V> + Send + Sync>;

// == File System Backed Cache ==
/// Cache keeping each value as a blob named by the normalized key.
///
/// Values pass through `encode` on the way in and `decode` on the way out;
/// `F` decides where the bytes live.
pub struct FileSystemBackedCache<K: ?Sized, V, F> {
    encode: Encoder<V>,
    decode: Decoder<V>,
    file_store: F,
    _key: PhantomData<fn(&K)>,
}

impl<K, V, F> FileSystemBackedCache<K, V, F>
where
    K: CacheKey + ?Sized,
    F: FileStore,
{
    // == Constructor ==
    /// Creates a cache over `file_store` with the given codec.
    ///
    /// # Arguments
    /// * `encode` - Turns a value into bytes; None drops the write
    /// * `decode` - Turns bytes back into a value; None is a miss
    /// * `file_store` - Where the bytes live
    pub fn new(
        encode: impl Fn(&V) -> Option<Vec<u8>> + Send + Sync + 'static,
        decode: impl Fn(&[u8]) -> Option<V> + Send + Sync + 'static,
        file_store: F,
    ) -> Self {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
            file_store,
            _key: PhantomData,
        }
    }

    /// The file store holding the encoded values.
    pub fn file_store(&self) -> &F {
        &self.file_store
    }

    // == Insert ==
    /// Encodes and archives `value`. An encode failure silently drops the write.
    pub fn insert(&self, key: &K, value: &V) {
        let Some(data) = (self.encode)(value) else {
            debug!("Value could not be encoded, skipping cache write");
            return;
        };
        self.file_store.archive(data, &normalized_key(key));
    }

    // == Value ==
    /// Reads and decodes the value for `key`. Absence and decode failure are misses.
    pub fn value(&self, key: &K) -> Option<V> {
        let data = self.file_store.data(&normalized_key(key))?;
        let value = (self.decode)(&data);
        if value.is_none() {
            debug!("Cached bytes could not be decoded, treating as miss");
        }
        value
    }

    // == Remove Value ==
    /// Deletes the blob for `key`. No-op if absent.
    pub fn remove_value(&self, key: &K) {
        self.file_store.delete(&normalized_key(key));
    }

    // == Clear ==
    /// Deletes every blob in the file store.
    pub fn clear(&self) {
        self.file_store.delete_all();
    }

    /// Indexed write: `Some` inserts, `None` removes.
    pub fn assign(&self, key: &K, value: Option<&V>) {
        match value {
            Some(value) => self.insert(key, value),
            None => self.remove_value(key),
        }
    }

    /// Number of blobs in the file store.
    pub fn count(&self) -> usize {
        self.file_store.keys().len()
    }

    /// Returns true if the file store lists no blobs.
    pub fn is_empty(&self) -> bool {
        self.file_store.keys().is_empty()
    }
}

impl<K, V, F> FileSystemBackedCache<K, V, F>
where
    K: CacheKey + ?Sized,
    V: Serialize + DeserializeOwned,
    F: FileStore,
{
    /// Creates a cache storing values as JSON.
    pub fn json(file_store: F) -> Self {
        Self::new(
            |value: &V| serde_json::to_vec(value).ok(),
            |bytes: &[u8]| serde_json::from_slice(bytes).ok(),
            file_store,
        )
    }
}

impl<K, V> FileSystemBackedCache<K, V, DirectoryFileStore>
where
    K: CacheKey + ?Sized,
{
    /// Creates a cache whose files live in `directory`.
    pub async fn directory_cache(
        directory: impl Into<PathBuf>,
        encode: impl Fn(&V) -> Option<Vec<u8>> + Send + Sync + 'static,
        decode: impl Fn(&[u8]) -> Option<V> + Send + Sync + 'static,
    ) -> Result<Self> {
        let file_store = DirectoryFileStore::open(directory).await?;
        Ok(Self::new(encode, decode, file_store))
    }

    /// Creates a cache in the directory `<base>[/<group>]/<name>.cache`.
    pub async fn named_directory_cache(
        name: &str,
        group: Option<&str>,
        location: &CacheLocation,
        encode: impl Fn(&V) -> Option<Vec<u8>> + Send + Sync + 'static,
        decode: impl Fn(&[u8]) -> Option<V> + Send + Sync + 'static,
    ) -> Result<Self> {
        let directory =
            location
                .cache_path(name, group)
                .ok_or_else(|| CacheError::NoDirectory {
                    name: name.to_string(),
                    group: group.map(str::to_string),
                })?;
        Self::directory_cache(directory, encode, decode).await
    }

    /// Waits for queued writes and deletes to land on disk.
    pub async fn flush(&self) {
        self.file_store.flush().await
    }
}

impl<K, V, F> Caching for FileSystemBackedCache<K, V, F>
where
    K: CacheKey + Sized,
    F: FileStore,
{
    type Key = K;
    type Value = V;

    fn insert(&self, key: K, value: V) {
        FileSystemBackedCache::insert(self, &key, &value)
    }

    fn value(&self, key: &K) -> Option<V> {
        FileSystemBackedCache::value(self, key)
    }

    fn remove_value(&self, key: &K) {
        FileSystemBackedCache::remove_value(self, key)
    }

    fn clear(&self) {
        FileSystemBackedCache::clear(self)
    }

    fn count(&self) -> usize {
        FileSystemBackedCache::count(self)
    }

    fn is_empty(&self) -> bool {
        FileSystemBackedCache::is_empty(self)
    }
}

impl<K: ?Sized, V, F: fmt::Debug> fmt::Debug for FileSystemBackedCache<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemBackedCache")
            .field("file_store", &self.file_store)
            .finish_non_exhaustive()
    }
}
