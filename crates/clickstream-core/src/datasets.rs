use crate::error::{ClickstreamError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

// ── Shared constants ──────────────────────────────────────────────────────────

/// Dataset analysed when no label is given.
pub const DEFAULT_LABEL: &str = "2019-Oct";

/// Default resident budget per batch, in megabytes.
pub const DEFAULT_SIZE_MB: f64 = 1_000.0;

/// Size assumed for a label that is not in the catalog.
pub const FALLBACK_TOTAL_SIZE_MB: f64 = 7_000.0;

/// Object-store prefix used when a dataset is read remotely.
pub const REMOTE_PREFIX: &str = "s3://sapienza2020adm/ecommerce";

// ── DatasetInfo ───────────────────────────────────────────────────────────────

/// Known totals for one dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_n_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size_mb: Option<f64>,
}

// ── DatasetCatalog ────────────────────────────────────────────────────────────

/// Lookup table of dataset labels and their size metadata.
///
/// The two monthly logs are built in; a JSON file can add labels or
/// override the built-in figures.
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    entries: BTreeMap<String, DatasetInfo>,
    strict: bool,
}

impl Default for DatasetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DatasetCatalog {
    /// The catalog shipped with the tool.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "2019-Oct".to_string(),
            DatasetInfo {
                total_n_rows: Some(42_448_764),
                total_size_mb: Some(5_407.0),
            },
        );
        entries.insert(
            "2019-Nov".to_string(),
            DatasetInfo {
                total_n_rows: Some(67_501_979),
                total_size_mb: Some(8_590.0),
            },
        );
        Self {
            entries,
            strict: false,
        }
    }

    /// Built-in catalog with the entries of `path` merged on top.
    ///
    /// The file is a JSON object keyed by label, e.g.
    /// `{"2019-Dec": {"total_n_rows": 1000, "total_size_mb": 120}}`.
    pub fn with_overrides_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut catalog = Self::builtin();
        catalog.merge_json(&content)?;
        Ok(catalog)
    }

    /// Merge a JSON object of `label -> DatasetInfo` into the catalog.
    pub fn merge_json(&mut self, content: &str) -> Result<()> {
        let extra: BTreeMap<String, DatasetInfo> = serde_json::from_str(content)?;
        self.entries.extend(extra);
        Ok(())
    }

    /// When strict, labels missing from the catalog are a configuration
    /// error instead of falling back to [`FALLBACK_TOTAL_SIZE_MB`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn get(&self, label: &str) -> Option<&DatasetInfo> {
        self.entries.get(label)
    }

    /// All labels, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of rows per batch for `label` under a `size_mb` budget.
    ///
    /// The dataset size is split into `max(1, ceil(total_size / size_mb))`
    /// batches and the known row total is spread evenly across them.
    /// Returns `None` (read everything in one batch) when no budget is given
    /// or the row total is unknown.
    pub fn batch_rows(&self, label: &str, size_mb: Option<f64>) -> Result<Option<usize>> {
        let info = match self.get(label) {
            Some(info) => Some(*info),
            None if self.strict => return Err(ClickstreamError::UnknownDataset(label.to_string())),
            None => {
                warn!(
                    "Dataset '{}' is not in the catalog; assuming {} MB with unknown row count",
                    label, FALLBACK_TOTAL_SIZE_MB
                );
                None
            }
        };

        let Some(size_mb) = size_mb.filter(|mb| *mb > 0.0) else {
            return Ok(None);
        };

        let total_size_mb = info
            .and_then(|i| i.total_size_mb)
            .unwrap_or(FALLBACK_TOTAL_SIZE_MB);
        let n_chunks = (total_size_mb / size_mb).ceil().max(1.0);

        Ok(info
            .and_then(|i| i.total_n_rows)
            .map(|rows| (rows as f64 / n_chunks).ceil() as usize))
    }
}

// ── SourceOptions ─────────────────────────────────────────────────────────────

/// How a report reads its dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOptions {
    /// Directory holding `<label>.csv` files.
    pub data_dir: PathBuf,
    /// Resolve to the object-store URI instead of `data_dir`.
    pub remote: bool,
    /// Resident budget per batch in megabytes; `None` reads in one batch.
    pub size_mb: Option<f64>,
    /// Hard cap on the rows read.
    pub nrows: Option<u64>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("datasets"),
            remote: false,
            size_mb: Some(DEFAULT_SIZE_MB),
            nrows: None,
        }
    }
}

// ── Location ──────────────────────────────────────────────────────────────────

/// Where the rows of a dataset live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Remote(String),
}

impl Location {
    /// Resolve `label` to a file under `data_dir`, or to the object-store
    /// URI when `remote` is set.
    pub fn resolve(data_dir: &Path, label: &str, remote: bool) -> Self {
        if remote {
            Location::Remote(format!("{}/{}.csv", REMOTE_PREFIX, label))
        } else {
            Location::Local(data_dir.join(format!("{}.csv", label)))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
