//! Pure analytics core: data model, metrics, signals, sizing.

pub mod trade;
pub mod period;
pub mod stats;
pub mod report;
pub mod metrics;
pub mod cohorts;
pub mod signal;
pub mod sizing;
pub mod error;
