//! Cache Cow - time-bounded key/value caches
//!
//! Provides an in-memory cache with lazy TTL expiration over a bounded store,
//! freeze-dry persistence of whole caches, and a file system backed cache that
//! keeps one file per entry.

pub mod cache;
pub mod caching;
pub mod clock;
pub mod config;
pub mod error;
pub mod file_backed;
pub mod persist;

pub use cache::{BoundedTtlCache, CacheStats};
pub use caching::Caching;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use file_backed::{normalize, DirectoryFileStore, FileStore, FileSystemBackedCache, MemoryFileStore};
pub use persist::{CacheArchiver, CacheLocation, FreezeDried};
