//! Soccer player statistics: load a season table, derive per-match and
//! per-90 rates, filter by league / position / thresholds and aggregate
//! the result for display.

pub mod config;
pub mod data;
