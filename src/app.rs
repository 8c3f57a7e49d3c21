//! Application flow for a single peakfinder run
//!
//! A run geocodes the address, fetches raw nodes through the cache, builds
//! peak records and prints them. Any failure aborts before output is written.

use std::io::{self, Write};

use thiserror::Error;

use crate::cache::{CacheError, CacheManager, FetchError, PeakCache};
use crate::cli::RunConfig;
use crate::data::{AreaQuery, GeocodeError, Geocoder, NominatimClient, OverpassClient, QueryError};
use crate::pipeline::build_peaks;
use crate::presenter::present;

/// Fatal errors for a run
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Query(e) => AppError::Query(e),
            FetchError::Cache(e) => AppError::Cache(e),
        }
    }
}

/// Runs against the public geocoding and area query services, printing to stdout
pub async fn run(config: &RunConfig) -> Result<(), AppError> {
    let geocoder = NominatimClient::new()?;
    let cache_manager = match &config.cache_dir {
        Some(dir) => CacheManager::with_dir(dir.clone()),
        None => CacheManager::new()?,
    };
    let peak_cache = PeakCache::new(cache_manager, OverpassClient::new()?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(config, &geocoder, &peak_cache, &mut out).await
}

/// Runs with the given services, writing the table to `out`
pub async fn run_with<G, Q, W>(
    config: &RunConfig,
    geocoder: &G,
    peak_cache: &PeakCache<Q>,
    out: &mut W,
) -> Result<(), AppError>
where
    G: Geocoder,
    Q: AreaQuery,
    W: Write,
{
    let origin = geocoder.geocode(&config.address).await?;
    let nodes = peak_cache
        .fetch_peaks(&config.address, config.radius_km, origin)
        .await?;

    let peaks = build_peaks(&nodes, origin);
    present(out, &peaks, config.sort_key, config.descending, config.limit)?;
    Ok(())
}
