/// File readers for the two input formats.
///
/// Submodules:
/// - `usgs_daily` — whitespace-delimited USGS daily discharge files.
/// - `metrics` — comma-delimited annual/monthly metrics tables.

pub mod metrics;
pub mod usgs_daily;
