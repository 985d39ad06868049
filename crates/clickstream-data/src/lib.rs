//! Data layer for the clickstream reports.
//!
//! Reads a dataset as bounded batches, aggregates each batch by a grouping
//! key and folds the partial results into one cumulative aggregate that the
//! reports finalize.

pub mod accumulator;
pub mod reader;
pub mod reports;

pub use clickstream_core as core;
