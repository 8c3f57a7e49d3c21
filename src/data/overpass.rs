//! Overpass API client
//!
//! Queries OpenStreetMap through the Overpass API for all nodes tagged
//! `natural=peak` within a radius of a coordinate.

use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use super::RawNode;

/// Base URL for the Overpass interpreter endpoint
const OVERPASS_BASE_URL: &str = "https://overpass-api.de/api/interpreter";

const USER_AGENT: &str = concat!("peakfinder/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Server-side query timeout in seconds, kept below the HTTP timeout
const QUERY_TIMEOUT_SECS: u64 = 50;

/// Errors that can occur when running an area query
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP request failed or the service returned an error status
    #[error("area query request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("failed to parse area query response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The server aborted the query, e.g. on its own timeout or memory limit
    #[error("area query failed on the server: {0}")]
    Remote(String),
}

/// Finds peak features around a coordinate
#[allow(async_fn_in_trait)]
pub trait AreaQuery {
    async fn query_peaks_around(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<Vec<RawNode>, QueryError>;
}

/// Client for the Overpass API
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: Client,
    base_url: String,
}

impl OverpassClient {
    /// Create a new OverpassClient pointing at the public instance
    pub fn new() -> Result<Self, QueryError> {
        Self::with_base_url(OVERPASS_BASE_URL)
    }

    /// Create a new OverpassClient against a custom endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, QueryError> {
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

impl AreaQuery for OverpassClient {
    async fn query_peaks_around(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<Vec<RawNode>, QueryError> {
        let query = peak_query(lat, lon, radius_meters);
        debug!("Overpass query: {}", query);

        let text = self
            .client
            .post(&self.base_url)
            .form(&[("data", query.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_response(&text)
    }
}

/// Builds the Overpass QL query for peaks around a point
fn peak_query(lat: f64, lon: f64, radius_meters: f64) -> String {
    format!(
        "[out:json][timeout:{}];node[natural=peak](around:{},{},{});out;",
        QUERY_TIMEOUT_SECS, radius_meters, lat, lon
    )
}

/// Parses an Overpass JSON response into raw nodes
///
/// Elements other than nodes are ignored. A `runtime error` remark means the
/// element list is empty or partial and fails the whole query.
fn parse_response(text: &str) -> Result<Vec<RawNode>, QueryError> {
    let response: OverpassResponse = serde_json::from_str(text)?;

    if let Some(remark) = response.remark {
        if remark.trim_start().starts_with("runtime error") {
            return Err(QueryError::Remote(remark));
        }
        warn!("Overpass remark: {}", remark);
    }

    let nodes = response
        .elements
        .into_iter()
        .filter_map(|element| match element {
            OverpassElement {
                kind,
                lat: Some(latitude),
                lon: Some(longitude),
                tags,
            } if kind == "node" => Some(RawNode {
                latitude,
                longitude,
                tags,
            }),
            _ => None,
        })
        .collect();

    Ok(nodes)
}

/// Overpass API response structure
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
    /// Set by the server when the query was cut short
    #[serde(default)]
    remark: Option<String>,
}

/// A single element from an Overpass response
#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}
