//! Core data models for Peakfinder
//!
//! This module contains the types that flow through a run: the geocoded
//! origin, raw point features returned by the area query, and the derived
//! peak records that get printed.

pub mod geocoder;
pub mod overpass;

pub use geocoder::{GeocodeError, Geocoder, NominatimClient};
pub use overpass::{AreaQuery, OverpassClient, QueryError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag holding a feature's name
pub const NAME_TAG: &str = "name";

/// Tag holding a feature's elevation in meters
pub const ELEVATION_TAG: &str = "ele";

/// A geographic position in WGS84 degrees
///
/// Produced once per run by the geocoder and used as the distance origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A single point feature returned by the area query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
    /// Key/value tags attached to the feature
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl RawNode {
    /// Returns the value of a tag, if present
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// A named peak with a known elevation, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    /// Peak name, never empty
    pub name: String,
    /// Elevation in meters
    pub elevation_meters: i32,
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
    /// Geodesic distance from the search origin in kilometers
    pub distance_km: f64,
}
