//! Spectra Aggregate
//!
//! Combines phase results into cross-phase reports and reads typed views
//! back out of their generic `data` maps.

mod aggregator;
mod extract;
mod summary;

pub use aggregator::{AggregatedResult, NO_RESULTS_MESSAGE, ResultAggregator};
