//! Error types for the cache library
//!
//! Provides unified error handling using thiserror. Cache misses are never
//! errors; only persistence and file store configuration problems surface here.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache persistence and file-backed storage.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No usable location exists for a persisted cache
    #[error("No writable location for cache {name} {}", describe_group(.group))]
    NoWritableLocation { name: String, group: Option<String> },

    /// A persisted cache file was expected but not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A path that must be a directory exists as something else
    #[error("Cannot use {} because it is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A file store was asked to delete something that is not there
    #[error("File does not exist at {}", .0.display())]
    FileDoesNotExist(PathBuf),

    /// No directory can back a file system cache with this name
    #[error("No directory can be used as a file system backed cache named {name} {}", describe_group(.group))]
    NoDirectory { name: String, group: Option<String> },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_group(group: &Option<String>) -> String {
    match group {
        Some(group) => format!("with group id {}", group),
        None => "with no group id".to_string(),
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
