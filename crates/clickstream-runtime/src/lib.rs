//! Runtime layer for the clickstream reports.
//!
//! Resolves dataset labels, runs reports through the data layer, keeps the
//! per-session category cache and drives the interactive category prompt.

pub mod category_cache;
pub mod prompt;
pub mod runner;

pub use clickstream_core as core;
pub use clickstream_data as data;
