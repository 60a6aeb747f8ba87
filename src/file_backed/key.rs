//! Cache key normalization
//!
//! Turns an arbitrary key into a file name: split on whitespace and
//! punctuation, drop empty fragments, reverse, and join with nothing.
//! Fragments stay readable, so a file can be traced back to its key by eye.
//!
//! Distinct keys with the same fragments in the same order collide
//! (`"a-b"` and `"a b"` both become `"ba"`); callers pick keys accordingly.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Unicode whitespace (including newlines) and Unicode punctuation.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\p{P}]+").unwrap());

/// Normalizes a raw key into a separator-free, filesystem-safe identifier.
///
/// ```
/// use cache_cow::file_backed::normalize;
///
/// assert_eq!(normalize("burger shop"), "shopburger");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    let fragments: Vec<&str> = SEPARATORS
        .split(raw)
        .filter(|fragment| !fragment.is_empty())
        .collect();
    fragments.into_iter().rev().collect()
}

// == Cache Key ==
/// A key that can name a file in a file system backed cache.
pub trait CacheKey {
    /// The raw string form of the key, before normalization.
    fn cache_key(&self) -> String;
}

impl CacheKey for str {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for Path {
    fn cache_key(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

impl CacheKey for PathBuf {
    fn cache_key(&self) -> String {
        self.as_path().cache_key()
    }
}

impl<T: CacheKey + ?Sized> CacheKey for &T {
    fn cache_key(&self) -> String {
        (**self).cache_key()
    }
}

/// The file name a key is stored under.
pub fn normalized_key<K: CacheKey + ?Sized>(key: &K) -> String {
    normalize(&key.cache_key())
}
