//! Turns raw area query nodes into peak records
//!
//! Nodes without both a name and an elevation are dropped, as are nodes whose
//! elevation cannot be read as a number. Neither case is an error: most point
//! features simply lack these tags.

use geo::{Distance, Geodesic, Point};
use log::debug;

use crate::data::{Location, Peak, RawNode, ELEVATION_TAG, NAME_TAG};

impl From<Location> for Point<f64> {
    fn from(location: Location) -> Self {
        Point::new(location.longitude, location.latitude)
    }
}

/// Geodesic distance between two locations on the WGS84 ellipsoid, in kilometers
pub fn distance_km(a: Location, b: Location) -> f64 {
    Geodesic::distance(Point::from(a), Point::from(b)) / 1000.0
}

/// Parses an elevation tag into whole meters
///
/// Accepts plain integers, decimals (truncated toward zero), a decimal comma,
/// and a trailing `m` unit, e.g. "1445", "1445.7", "1445,7", "1445 m".
/// A comma followed by exactly three digits ("1,445") could be a thousands
/// separator and is rejected, as is more than one comma.
pub fn parse_elevation(raw: &str) -> Option<i32> {
    let value = raw.trim();
    let value = value.strip_suffix('m').unwrap_or(value).trim_end();
    if let Some((_, fraction)) = value.split_once(',') {
        let thousands = fraction.len() == 3 && fraction.bytes().all(|b| b.is_ascii_digit());
        if thousands || fraction.contains(',') {
            return None;
        }
    }
    let value = value.replace(',', ".");

    let meters = value.parse::<f64>().ok().filter(|m| m.is_finite())?;
    let meters = meters.trunc();
    if meters < i32::MIN as f64 || meters > i32::MAX as f64 {
        return None;
    }
    Some(meters as i32)
}

/// Builds peak records from raw nodes, in input order
pub fn build_peaks(nodes: &[RawNode], origin: Location) -> Vec<Peak> {
    let mut missing_tags = 0usize;
    let mut bad_elevation = 0usize;
    let mut peaks = Vec::with_capacity(nodes.len());

    for node in nodes {
        let (name, ele) = match (node.tag(NAME_TAG), node.tag(ELEVATION_TAG)) {
            (Some(name), Some(ele)) if !name.trim().is_empty() => (name.trim(), ele),
            _ => {
                missing_tags += 1;
                continue;
            }
        };

        let Some(elevation_meters) = parse_elevation(ele) else {
            bad_elevation += 1;
            continue;
        };

        let position = Location::new(node.latitude, node.longitude);
        peaks.push(Peak {
            name: name.to_string(),
            elevation_meters,
            latitude: node.latitude,
            longitude: node.longitude,
            distance_km: distance_km(origin, position),
        });
    }

    debug!(
        "Built {} peaks from {} nodes ({} without name/elevation, {} with unparseable elevation)",
        peaks.len(),
        nodes.len(),
        missing_tags,
        bad_elevation
    );

    peaks
}
