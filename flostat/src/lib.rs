//! Streamflow comparison for two USGS gauges.
//!
//! Reads daily discharge files, clips them to a common water-year window,
//! derives monthly statistics and a seasonal profile, ranks annual peaks,
//! and writes the data behind the comparison figures.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
