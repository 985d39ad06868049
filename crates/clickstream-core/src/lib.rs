//! Shared building blocks for the clickstream reports.
//!
//! Holds the event model, the error type, the dataset catalog with its
//! batch-sizing rule, timestamp parsing, finalization statistics, console
//! formatting helpers and the command-line settings.

pub mod datasets;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;
pub mod time_utils;

pub use error::{ClickstreamError, Result};
