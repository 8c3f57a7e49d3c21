//! Peakfinder Library
//!
//! Geocodes an address, queries named peaks within a radius, caches the raw
//! query result on disk, and prints a sorted table. The modules are exposed
//! for use in integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod pipeline;
pub mod presenter;
