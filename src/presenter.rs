//! Sorting and table rendering for peak lists

use std::io::{self, Write};

use clap::ValueEnum;
use log::debug;

use crate::data::Peak;

/// Key to sort peaks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    /// Elevation in meters
    #[default]
    Elevation,
    /// Distance from the search origin
    Distance,
}

impl SortKey {
    /// Direction used when the order is not inverted
    ///
    /// Elevation lists the highest peak first, distance the nearest one.
    pub fn descending_by_default(self) -> bool {
        match self {
            SortKey::Elevation => true,
            SortKey::Distance => false,
        }
    }
}

/// Sorts, optionally reverses, and truncates peaks for display
///
/// The ascending sort is stable; `descending` reverses its result. A `limit`
/// of 0 keeps every peak.
pub fn arrange(peaks: &[Peak], key: SortKey, descending: bool, limit: usize) -> Vec<Peak> {
    let mut sorted = peaks.to_vec();
    match key {
        SortKey::Elevation => sorted.sort_by_key(|p| p.elevation_meters),
        SortKey::Distance => sorted.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km)),
    }
    if descending {
        sorted.reverse();
    }
    if limit > 0 {
        sorted.truncate(limit);
    }
    sorted
}

/// Writes one aligned line per peak; writes nothing for an empty list
///
/// Name widths are counted in `char`s, so names with wide (CJK) or combining
/// characters can shift the following columns in a terminal.
pub fn render<W: Write>(out: &mut W, peaks: &[Peak]) -> io::Result<()> {
    let name_width = peaks
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0);
    let rank_width = peaks.len().to_string().len();

    for (i, peak) in peaks.iter().enumerate() {
        writeln!(
            out,
            "{rank:>rank_width$}. {name:<name_width$}  {ele:>5} m  {dist:>8.3} km  {lat:>8.3} {lon:>8.3}",
            rank = i + 1,
            name = peak.name,
            ele = peak.elevation_meters,
            dist = peak.distance_km,
            lat = peak.latitude,
            lon = peak.longitude,
        )?;
    }
    Ok(())
}

/// Arranges peaks and prints them as a table to `out` (stdout in the binary)
pub fn present<W: Write>(
    out: &mut W,
    peaks: &[Peak],
    key: SortKey,
    descending: bool,
    limit: usize,
) -> io::Result<()> {
    let selected = arrange(peaks, key, descending, limit);
    debug!("Printing {} of {} peaks", selected.len(), peaks.len());
    render(out, &selected)?;
    out.flush()
}
