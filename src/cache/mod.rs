//! Cache module for storing area query responses to disk
//!
//! This module provides a cache manager that persists query responses as
//! versioned JSON records, and a peak cache that memoizes area queries per
//! (address, radius) pair. Entries are never invalidated automatically.

mod manager;
mod peaks;

pub use manager::{CacheError, CacheManager, CACHE_FORMAT_VERSION};
pub use peaks::{cache_key, normalize_address, whole_km, FetchError, PeakCache, PeakQuery};
