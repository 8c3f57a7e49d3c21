//! Cache manager for persisting query responses to disk
//!
//! Provides a `CacheManager` that stores serializable data to JSON files
//! wrapped in a versioned record. Entries never expire; a stale entry stays
//! until its file is deleted.

use chrono::{DateTime, Utc};
use directories::BaseDirs;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Version of the on-disk record layout
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Name of the cache directory inside the user's home directory
const CACHE_DIR_NAME: &str = ".peakfinder";

/// Errors that can occur when reading or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// No home directory to place the default cache in
    #[error("cannot determine home directory for the cache")]
    NoHomeDir,

    /// Filesystem operation failed
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold a valid record
    #[error("corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The record was written by an incompatible version
    #[error("cache file {path} has unsupported format version {found} (expected {expected}); delete it to refetch")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord<T> {
    /// Record layout version
    version: u32,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// The cached data
    data: T,
}

/// Only the version field, read before trusting the rest of the file
#[derive(Debug, Deserialize)]
struct RecordHeader {
    version: u32,
}

/// Manages reading and writing cached data to disk
///
/// The cache manager stores data as JSON files in `~/.peakfinder/` by default.
/// Writes go to a temporary file in the same directory which is renamed into
/// place once complete, so readers never see a partially written entry.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using `~/.peakfinder/`
    pub fn new() -> Result<Self, CacheError> {
        let base_dirs = BaseDirs::new().ok_or(CacheError::NoHomeDir)?;
        let cache_dir = base_dirs.home_dir().join(CACHE_DIR_NAME);
        Ok(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to a cache file for the given key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))
    }

    /// Writes data to the cache, replacing any existing entry atomically
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "peaks_graz_10")
    /// * `data` - The data to cache (must implement Serialize)
    pub fn write<T: Serialize>(&self, key: &str, data: &T) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let path = self.path_for(key);
        let record = CacheRecord {
            version: CACHE_FORMAT_VERSION,
            cached_at: Utc::now(),
            data,
        };

        let json = serde_json::to_vec_pretty(&record).map_err(|e| CacheError::Corrupt {
            path: path.clone(),
            source: e,
        })?;

        let mut tmp =
            NamedTempFile::new_in(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))?;
        tmp.write_all(&json).map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| CacheError::io(&path, e.error))?;

        debug!("Wrote cache entry {}", path.display());
        Ok(())
    }

    /// Reads data from the cache
    ///
    /// # Returns
    /// * `Ok(None)` if no entry exists for the key
    /// * `Ok(Some(data))` if the entry exists and parses
    /// * `Err` if the file cannot be read, is corrupt, or has another version
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };

        let corrupt = |source| CacheError::Corrupt {
            path: path.clone(),
            source,
        };

        let header: RecordHeader = serde_json::from_str(&content).map_err(corrupt)?;
        if header.version != CACHE_FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion {
                path: path.clone(),
                found: header.version,
                expected: CACHE_FORMAT_VERSION,
            });
        }

        let record: CacheRecord<T> = serde_json::from_str(&content).map_err(corrupt)?;
        debug!(
            "Read cache entry {} (cached at {})",
            path.display(),
            record.cached_at
        );
        Ok(Some(record.data))
    }
}
