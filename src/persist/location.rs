//! Persisted cache locations
//!
//! Maps a logical cache name and optional group to a path under the platform
//! cache directory (or a configured root).

use std::io;
use std::path::PathBuf;

use directories::BaseDirs;

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Extension given to every persisted cache.
pub const CACHE_EXTENSION: &str = "cache";

// == Cache Location ==
/// Where persisted caches live.
///
/// Without an explicit root the platform cache directory is used
/// (`~/.cache` on Linux, `~/Library/Caches` on macOS). A group becomes a
/// subdirectory shared by every cache in that group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheLocation {
    root: Option<PathBuf>,
}

impl CacheLocation {
    /// Uses the platform cache directory.
    pub fn system() -> Self {
        Self { root: None }
    }

    /// Uses `root` instead of the platform cache directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Uses the configured cache root, or the platform cache directory when unset.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            root: config.cache_root.clone(),
        }
    }

    /// Directory holding the caches of `group`, None if none can be determined.
    pub fn base_dir(&self, group: Option<&str>) -> Option<PathBuf> {
        let base = match &self.root {
            Some(root) => root.clone(),
            None => BaseDirs::new()?.cache_dir().to_path_buf(),
        };

        match group {
            Some(group) if is_path_component(group) => Some(base.join(group)),
            Some(_) => None,
            None => Some(base),
        }
    }

    /// Path of the cache called `name` in `group`: `<base>[/<group>]/<name>.cache`.
    pub fn cache_path(&self, name: &str, group: Option<&str>) -> Option<PathBuf> {
        if !is_path_component(name) {
            return None;
        }
        let dir = self.base_dir(group)?;
        Some(dir.join(format!("{}.{}", name, CACHE_EXTENSION)))
    }

    /// Like `cache_path`, but a missing location is a `NoWritableLocation` error.
    pub(crate) fn require_path(&self, name: &str, group: Option<&str>) -> Result<PathBuf> {
        self.cache_path(name, group)
            .ok_or_else(|| CacheError::NoWritableLocation {
                name: name.to_string(),
                group: group.map(str::to_string),
            })
    }
}

fn is_path_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

/// Turns a failed read of `path` into the error callers see.
pub(crate) fn read_error(path: PathBuf, err: io::Error) -> CacheError {
    if err.kind() == io::ErrorKind::NotFound {
        CacheError::FileNotFound(path)
    } else {
        CacheError::Io(err)
    }
}

/// Turns a failed parent directory creation into `NoWritableLocation`.
pub(crate) fn unwritable(name: &str, group: Option<&str>) -> CacheError {
    CacheError::NoWritableLocation {
        name: name.to_string(),
        group: group.map(str::to_string),
    }
}
