use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the clickstream reports.
#[derive(Error, Debug)]
pub enum ClickstreamError {
    /// The source file behind a dataset label does not exist.
    ///
    /// This is the only error a report boundary catches; everything else
    /// aborts the run.
    #[error("File with a label '{label}' does not exist ({path})")]
    DatasetNotFound { label: String, path: PathBuf },

    /// The dataset was resolved to an object-store URI, which this build
    /// cannot stream from.
    #[error("Remote sources are not readable: {0}")]
    RemoteSource(String),

    /// A dataset label is absent from the catalog while strict labels are on.
    #[error("Unknown dataset label: {0}")]
    UnknownDataset(String),

    /// A requested column is not present in the CSV header.
    #[error("Missing column in source header: {0}")]
    MissingColumn(String),

    /// A cell could not be coerced into the column's declared type.
    #[error("Line {line}: cannot read {column} from {value:?}")]
    Coercion {
        line: u64,
        column: &'static str,
        value: String,
    },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// The CSV reader failed mid-stream.
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A dataset catalog file could not be parsed.
    #[error("Failed to parse dataset catalog: {0}")]
    Catalog(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClickstreamError {
    /// Label of the dataset that could not be found, if this is that error.
    /// The one error kind a report wrapper recovers from.
    pub fn missing_label(&self) -> Option<&str> {
        match self {
            ClickstreamError::DatasetNotFound { label, .. } => Some(label),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the clickstream crates.
pub type Result<T> = std::result::Result<T, ClickstreamError>;
