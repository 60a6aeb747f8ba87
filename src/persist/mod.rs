//! Persistence Module
//!
//! Freeze-dry snapshots of bounded TTL caches and where they are stored.

mod archiver;
mod freeze_dry;
mod location;

pub use archiver::CacheArchiver;
pub use freeze_dry::FreezeDried;
pub use location::{CacheLocation, CACHE_EXTENSION};
