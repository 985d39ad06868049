//! Console presentation for the clickstream reports.
//!
//! Turns finalized [`ReportOutput`](clickstream_data::reports::ReportOutput)
//! values into labelled messages and horizontal bar charts built on
//! [`ratatui`] text primitives.

pub mod bar_chart;
pub mod summary;

pub use clickstream_core as core;
