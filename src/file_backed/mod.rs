//! File System Backed Cache Module
//!
//! A cache that stores one file per entry, named by a normalized key, with
//! byte I/O delegated to a file store.

mod cache;
mod directory;
mod file_store;
mod key;

pub use cache::FileSystemBackedCache;
pub use directory::DirectoryFileStore;
pub use file_store::{FileStore, MemoryFileStore};
pub use key::{normalize, normalized_key, CacheKey};
