//! File Store Module
//!
//! Byte-oriented storage addressed by normalized key, plus an in-memory
//! implementation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

// == File Store ==
/// Stores one blob per key.
///
/// Writes and deletes may complete after the call returns; failures are the
/// store's to log, not the caller's to handle.
pub trait FileStore: Send + Sync {
    /// Keys currently stored. This listing is the source of truth for counts.
    fn keys(&self) -> Vec<String>;

    /// Stores `data` under `key`, replacing any previous blob.
    fn archive(&self, data: Vec<u8>, key: &str);

    /// Returns the blob stored under `key`.
    fn data(&self, key: &str) -> Option<Vec<u8>>;

    /// Deletes the blob stored under `key`.
    fn delete(&self, key: &str);

    /// Deletes every blob.
    fn delete_all(&self);
}

impl<F: FileStore + ?Sized> FileStore for Arc<F> {
    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }

    fn archive(&self, data: Vec<u8>, key: &str) {
        (**self).archive(data, key)
    }

    fn data(&self, key: &str) -> Option<Vec<u8>> {
        (**self).data(key)
    }

    fn delete(&self, key: &str) {
        (**self).delete(key)
    }

    fn delete_all(&self) {
        (**self).delete_all()
    }
}

// == Memory File Store ==
/// A file store that keeps every blob in memory. Writes are immediate.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemoryFileStore {
    fn keys(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    fn archive(&self, data: Vec<u8>, key: &str) {
        self.files.write().insert(key.to_string(), data);
    }

    fn data(&self, key: &str) -> Option<Vec<u8>> {
        self.files.read().get(key).cloned()
    }

    fn delete(&self, key: &str) {
        self.files.write().remove(key);
    }

    fn delete_all(&self) {
        self.files.write().clear();
    }
}
