//! Peakfinder - List named mountain peaks around an address
//!
//! Resolves an address, finds peaks within a radius using OpenStreetMap data,
//! and prints them sorted by elevation or distance.

use std::process::ExitCode;

use clap::Parser;
use log::debug;

use peakfinder::app;
use peakfinder::cli::{Cli, RunConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    match app::run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Run failed: {:?}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
