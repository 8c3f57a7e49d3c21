//! Memoized peak queries keyed by address and radius

use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{CacheError, CacheManager};
use crate::data::{AreaQuery, Location, QueryError, RawNode};

/// Errors from fetching peaks through the cache
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Payload persisted for one (address, radius) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakQuery {
    /// Address as given on the command line
    pub address: String,
    /// Radius in whole kilometers
    pub radius_km: u32,
    /// Origin the query was run around
    pub origin: Location,
    /// Raw query result
    pub nodes: Vec<RawNode>,
}

/// Normalizes an address to lowercase alphanumerics only
///
/// "Hauptplatz 1, Graz" and "hauptplatz 1 graz" both become "hauptplatz1graz".
pub fn normalize_address(address: &str) -> String {
    address
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Longest normalized address, in bytes, kept verbatim in a cache file name
const MAX_KEY_ADDRESS_BYTES: usize = 100;

/// Hex digits of the address digest appended to shortened keys
const KEY_DIGEST_HEX_LEN: usize = 12;

/// Shortens a normalized address so the cache file name stays within
/// filesystem limits
///
/// Addresses up to `MAX_KEY_ADDRESS_BYTES` are kept as they are. Longer ones
/// are cut at a character boundary and suffixed with a digest of the full
/// normalized address, so distinct long addresses keep distinct keys.
fn key_address(normalized: &str) -> String {
    if normalized.len() <= MAX_KEY_ADDRESS_BYTES {
        return normalized.to_string();
    }

    let mut prefix = String::with_capacity(MAX_KEY_ADDRESS_BYTES);
    for c in normalized.chars() {
        if prefix.len() + c.len_utf8() > MAX_KEY_ADDRESS_BYTES {
            break;
        }
        prefix.push(c);
    }

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}-{}", prefix, &digest[..KEY_DIGEST_HEX_LEN])
}

/// Truncates a radius in kilometers to the whole number used in cache keys
pub fn whole_km(radius_km: f64) -> u32 {
    radius_km.trunc() as u32
}

/// Builds the cache key for an address and radius
pub fn cache_key(address: &str, radius_km: f64) -> String {
    format!(
        "peaks_{}_{}",
        key_address(&normalize_address(address)),
        whole_km(radius_km)
    )
}

/// Serves peak queries from disk, falling back to the area query on a miss
#[derive(Debug, Clone)]
pub struct PeakCache<Q> {
    cache: CacheManager,
    source: Q,
}

impl<Q: AreaQuery> PeakCache<Q> {
    pub fn new(cache: CacheManager, source: Q) -> Self {
        Self { cache, source }
    }

    /// Returns the raw peak nodes for an address and radius
    ///
    /// A cached entry is returned as-is without any network call. On a miss
    /// the area query runs around `origin` and its full result is persisted
    /// before being returned.
    pub async fn fetch_peaks(
        &self,
        address: &str,
        radius_km: f64,
        origin: Location,
    ) -> Result<Vec<RawNode>, FetchError> {
        let key = cache_key(address, radius_km);

        if let Some(cached) = self.cache.read::<PeakQuery>(&key)? {
            info!(
                "Using cached result {} ({} nodes)",
                self.cache.path_for(&key).display(),
                cached.nodes.len()
            );
            return Ok(cached.nodes);
        }

        let radius_meters = radius_km * 1000.0;
        debug!(
            "Cache miss for {}, querying {} m around ({:.4}, {:.4})",
            key, radius_meters, origin.latitude, origin.longitude
        );
        let nodes = self
            .source
            .query_peaks_around(origin.latitude, origin.longitude, radius_meters)
            .await?;

        let entry = PeakQuery {
            address: address.to_string(),
            radius_km: whole_km(radius_km),
            origin,
            nodes,
        };
        self.cache.write(&key, &entry)?;
        info!(
            "Cached {} nodes at {}",
            entry.nodes.len(),
            self.cache.path_for(&key).display()
        );

        Ok(entry.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// Area query that serves fixed nodes and counts its calls
    struct CountingQuery {
        nodes: Vec<RawNode>,
        calls: Cell<usize>,
        last_radius: Cell<f64>,
    }

    impl CountingQuery {
        fn new(nodes: Vec<RawNode>) -> Self {
            Self {
                nodes,
                calls: Cell::new(0),
                last_radius: Cell::new(0.0),
            }
        }
    }

    impl AreaQuery for &CountingQuery {
        async fn query_peaks_around(
            &self,
            _lat: f64,
            _lon: f64,
            radius_meters: f64,
        ) -> Result<Vec<RawNode>, QueryError> {
            self.calls.set(self.calls.get() + 1);
            self.last_radius.set(radius_meters);
            Ok(self.nodes.clone())
        }
    }

    /// Area query that always fails like a server-side timeout
    struct TimedOutQuery;

    impl AreaQuery for TimedOutQuery {
        async fn query_peaks_around(
            &self,
            _lat: f64,
            _lon: f64,
            _radius_meters: f64,
        ) -> Result<Vec<RawNode>, QueryError> {
            Err(QueryError::Remote(
                "runtime error: Query timed out in \"query\" at line 1 after 51 seconds."
                    .to_string(),
            ))
        }
    }

    fn sample_nodes() -> Vec<RawNode> {
        let mut tags = BTreeMap::new();
        tags.insert("name".to_string(), "Schöckl".to_string());
        tags.insert("ele".to_string(), "1445".to_string());
        vec![
            RawNode {
                latitude: 47.2166,
                longitude: 15.4628,
                tags,
            },
            RawNode {
                latitude: 47.05,
                longitude: 15.35,
                tags: BTreeMap::new(),
            },
        ]
    }

    fn graz() -> Location {
        Location::new(47.0707, 15.4395)
    }

    #[test]
    fn test_normalize_address_strips_case_and_punctuation() {
        assert_eq!(normalize_address("Hauptplatz 1, Graz"), "hauptplatz1graz");
        assert_eq!(
            normalize_address("Hauptplatz 1, Graz"),
            normalize_address("hauptplatz 1 graz")
        );
    }

    #[test]
    fn test_normalize_address_keeps_non_ascii_letters() {
        assert_eq!(normalize_address("Schöckl-Straße 3"), "schöcklstraße3");
    }

    #[test]
    fn test_cache_key_uses_whole_kilometers() {
        assert_eq!(cache_key("Graz", 10.0), "peaks_graz_10");
        assert_eq!(cache_key("Graz", 10.9), "peaks_graz_10");
        assert_eq!(cache_key("Graz", 0.5), "peaks_graz_0");
    }

    #[test]
    fn test_cache_key_equal_for_case_and_punctuation_variants() {
        assert_eq!(
            cache_key("Hauptplatz 1, Graz", 10.0),
            cache_key("hauptplatz 1 graz", 10.0)
        );
    }

    #[test]
    fn test_cache_key_long_address_is_shortened_with_digest() {
        let long = "Hauptplatz ".repeat(30);

        let key = cache_key(&long, 10.0);

        // peaks_ + 100 address bytes + '-' + 12 hex digits + _10
        assert_eq!(key.len(), 6 + 100 + 1 + 12 + 3);
        assert!(key.starts_with("peaks_hauptplatzhauptplatz"));
        assert!(key.ends_with("_10"));
        assert_eq!(key, cache_key(&long.to_uppercase().replace(' ', ", "), 10.0));
    }

    #[test]
    fn test_cache_key_long_addresses_differing_at_the_end_stay_distinct() {
        let base = "Hauptplatz ".repeat(30);

        let a = cache_key(&format!("{}Graz", base), 10.0);
        let b = cache_key(&format!("{}Wien", base), 10.0);

        assert_ne!(a, b);
    }

    #[test]
    fn test_cache_key_long_multibyte_address_stays_within_byte_budget() {
        let long = "Schöckl ".repeat(40);

        let key = cache_key(&long, 10.0);

        assert!(key.len() <= 6 + 100 + 1 + 12 + 3, "key too long: {}", key.len());
    }

    #[tokio::test]
    async fn test_fetch_peaks_long_address_is_cached() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let query = CountingQuery::new(sample_nodes());
        let cache = PeakCache::new(CacheManager::with_dir(temp_dir.path().to_path_buf()), &query);
        let address = "Hauptplatz ".repeat(30);

        let first = cache
            .fetch_peaks(&address, 10.0, graz())
            .await
            .expect("First fetch should succeed");
        let second = cache
            .fetch_peaks(&address, 10.0, graz())
            .await
            .expect("Second fetch should succeed");

        assert_eq!(query.calls.get(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_peaks_server_timeout_is_not_cached() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let manager = CacheManager::with_dir(temp_dir.path().to_path_buf());
        let cache = PeakCache::new(manager.clone(), TimedOutQuery);

        let result = cache.fetch_peaks("Graz", 10.0, graz()).await;

        assert!(matches!(result, Err(FetchError::Query(QueryError::Remote(_)))));
        let stored: Option<PeakQuery> = manager.read("peaks_graz_10").expect("Read should succeed");
        assert!(stored.is_none(), "Failed query must not be cached");
    }

    #[tokio::test]
    async fn test_fetch_peaks_queries_once_then_serves_cache() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let query = CountingQuery::new(sample_nodes());
        let cache = PeakCache::new(CacheManager::with_dir(temp_dir.path().to_path_buf()), &query);

        let first = cache
            .fetch_peaks("Hauptplatz 1, Graz", 10.0, graz())
            .await
            .expect("First fetch should succeed");
        let second = cache
            .fetch_peaks("Hauptplatz 1, Graz", 10.0, graz())
            .await
            .expect("Second fetch should succeed");

        assert_eq!(query.calls.get(), 1, "Second fetch should not query");
        assert_eq!(first, second);
        assert_eq!(first, sample_nodes());
    }

    #[tokio::test]
    async fn test_fetch_peaks_shares_entry_across_address_variants() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let query = CountingQuery::new(sample_nodes());
        let cache = PeakCache::new(CacheManager::with_dir(temp_dir.path().to_path_buf()), &query);

        cache
            .fetch_peaks("Hauptplatz 1, Graz", 10.0, graz())
            .await
            .expect("First fetch should succeed");
        cache
            .fetch_peaks("hauptplatz 1 graz", 10.0, graz())
            .await
            .expect("Second fetch should succeed");

        assert_eq!(query.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_fetch_peaks_different_radius_queries_again() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let query = CountingQuery::new(sample_nodes());
        let cache = PeakCache::new(CacheManager::with_dir(temp_dir.path().to_path_buf()), &query);

        cache
            .fetch_peaks("Graz", 10.0, graz())
            .await
            .expect("First fetch should succeed");
        cache
            .fetch_peaks("Graz", 25.0, graz())
            .await
            .expect("Second fetch should succeed");

        assert_eq!(query.calls.get(), 2);
        assert!((query.last_radius.get() - 25_000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_fetch_peaks_persists_query_payload() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let manager = CacheManager::with_dir(temp_dir.path().to_path_buf());
        let query = CountingQuery::new(sample_nodes());
        let cache = PeakCache::new(manager.clone(), &query);

        cache
            .fetch_peaks("Graz", 12.5, graz())
            .await
            .expect("Fetch should succeed");

        let stored: PeakQuery = manager
            .read("peaks_graz_12")
            .expect("Read should succeed")
            .expect("Entry should exist");
        assert_eq!(stored.address, "Graz");
        assert_eq!(stored.radius_km, 12);
        assert_eq!(stored.origin, graz());
        assert_eq!(stored.nodes, sample_nodes());
    }

    #[tokio::test]
    async fn test_fetch_peaks_fails_when_cache_unwritable() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "file").expect("Should create file");
        let query = CountingQuery::new(sample_nodes());
        let cache = PeakCache::new(CacheManager::with_dir(blocker.join("cache")), &query);

        let result = cache.fetch_peaks("Graz", 10.0, graz()).await;

        assert!(matches!(result, Err(FetchError::Cache(_))));
    }
}
