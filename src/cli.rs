//! Command-line interface parsing for Peakfinder
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated `RunConfig` that is passed through the rest of the run.

use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;
use thiserror::Error;

use crate::presenter::SortKey;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The address is empty or only whitespace
    #[error("Address must not be empty")]
    EmptyAddress,

    /// The radius is not a positive, finite number
    #[error("Invalid radius: {0} km. The radius must be a positive number of kilometers")]
    InvalidRadius(f64),
}

/// Peakfinder - List named peaks around an address
#[derive(Parser, Debug)]
#[command(name = "peakfinder")]
#[command(about = "List named mountain peaks within a radius of an address")]
#[command(version)]
pub struct Cli {
    /// Address to search around, e.g. "Hauptplatz 1, Graz"
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Search radius in kilometers
    #[arg(short, long, value_name = "RADIUS_KM", default_value_t = 10.0)]
    pub radius: f64,

    /// Number of peaks to print (0 prints all)
    #[arg(short = 'n', long, value_name = "COUNT", default_value_t = 0)]
    pub count: usize,

    /// Sort key
    ///
    /// Elevation lists the highest peak first, distance the nearest one.
    #[arg(short, long, value_enum, default_value_t = SortKey::Elevation)]
    pub sort: SortKey,

    /// Invert the default sort order
    #[arg(short, long)]
    pub invert: bool,

    /// Directory for cached query results (default: ~/.peakfinder)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Increase log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log level selected by the number of `-v` flags
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Configuration for a single run, derived from CLI arguments
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Address passed verbatim to the geocoder
    pub address: String,
    /// Search radius in kilometers
    pub radius_km: f64,
    /// Number of peaks to print, 0 for all
    pub limit: usize,
    /// Key to sort by
    pub sort_key: SortKey,
    /// Whether the final order is descending
    pub descending: bool,
    /// Cache directory override
    pub cache_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with the sort direction resolved
    /// * `Err(CliError)` if the address or radius is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.address.trim().is_empty() {
            return Err(CliError::EmptyAddress);
        }
        if !cli.radius.is_finite() || cli.radius <= 0.0 {
            return Err(CliError::InvalidRadius(cli.radius));
        }

        Ok(RunConfig {
            address: cli.address.clone(),
            radius_km: cli.radius,
            limit: cli.count,
            sort_key: cli.sort,
            descending: cli.sort.descending_by_default() != cli.invert,
            cache_dir: cli.cache_dir.clone(),
        })
    }
}
