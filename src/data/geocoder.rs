//! Nominatim geocoding client
//!
//! Resolves a free-text address to the coordinates of the service's best
//! match using the OpenStreetMap Nominatim search API.

use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::Location;

/// Base URL for the Nominatim search API
const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim rejects requests without an identifying User-Agent
const USER_AGENT: &str = concat!("peakfinder/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when geocoding an address
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed or the service is unreachable
    #[error("geocoding request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service has no match for the address
    #[error("address not found: '{0}'")]
    NotFound(String),

    /// The service returned coordinates that are not numbers
    #[error("invalid coordinate in geocoding response: '{0}'")]
    InvalidCoordinate(String),
}

/// Resolves addresses to locations
#[allow(async_fn_in_trait)]
pub trait Geocoder {
    async fn geocode(&self, address: &str) -> Result<Location, GeocodeError>;
}

/// Client for the Nominatim search API
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    /// Create a new NominatimClient pointing at the public service
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(NOMINATIM_BASE_URL)
    }

    /// Create a new NominatimClient against a custom endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, address: &str) -> Result<Location, GeocodeError> {
        debug!("Geocoding address: {}", address);

        let places = self
            .client
            .get(&self.base_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<NominatimPlace>>()
            .await?;

        let location = best_match(address, places)?;
        Ok(location)
    }
}

/// A single search result from Nominatim
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    /// Latitude as a decimal string
    lat: String,
    /// Longitude as a decimal string
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Picks the top result and parses its coordinates
fn best_match(address: &str, places: Vec<NominatimPlace>) -> Result<Location, GeocodeError> {
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

    let latitude = parse_coordinate(&place.lat)?;
    let longitude = parse_coordinate(&place.lon)?;

    info!(
        "Resolved '{}' to {} ({:.4}, {:.4})",
        address, place.display_name, latitude, longitude
    );

    Ok(Location::new(latitude, longitude))
}

fn parse_coordinate(value: &str) -> Result<f64, GeocodeError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::InvalidCoordinate(value.to_string()))
}
