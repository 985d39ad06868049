//! Chunked CSV source for the clickstream log.
//!
//! Streams a dataset as a lazy, finite, non-restartable sequence of
//! [`Batch`]es, each holding only the requested columns already coerced to
//! their types. Batch size is fixed before the first row is read.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use clickstream_core::datasets::{DatasetCatalog, Location, SourceOptions};
use clickstream_core::error::{ClickstreamError, Result};
use clickstream_core::models::{Column, EventRecord, EventType};
use clickstream_core::time_utils::parse_event_time;
use serde::Deserialize;
use tracing::{debug, warn};

/// Upper bound on the capacity reserved up front for one batch.
const MAX_PREALLOCATED_ROWS: usize = 65_536;

// ── Batch ─────────────────────────────────────────────────────────────────────

/// One bounded slice of rows.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Zero-based position of the batch in the stream.
    pub index: usize,
    pub records: Vec<EventRecord>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── ChunkSource ───────────────────────────────────────────────────────────────

/// Iterator of [`Batch`]es read from a CSV source.
///
/// A read or coercion error is yielded once and ends the stream; there is no
/// resume.
pub struct ChunkSource<R: Read> {
    reader: csv::Reader<R>,
    projection: Vec<(Column, usize)>,
    batch_rows: Option<usize>,
    row_cap: Option<u64>,
    rows_read: u64,
    batches_emitted: usize,
    record: csv::StringRecord,
    finished: bool,
}

impl ChunkSource<File> {
    /// Open the dataset behind `label` with the batch size the catalog
    /// derives from `options.size_mb`.
    ///
    /// A missing local file is reported as
    /// [`ClickstreamError::DatasetNotFound`]; a remote location as
    /// [`ClickstreamError::RemoteSource`].
    pub fn open(
        label: &str,
        columns: &[Column],
        options: &SourceOptions,
        catalog: &DatasetCatalog,
    ) -> Result<Self> {
        let path = match Location::resolve(&options.data_dir, label, options.remote) {
            Location::Local(path) => path,
            Location::Remote(uri) => return Err(ClickstreamError::RemoteSource(uri)),
        };
        let batch_rows = catalog.batch_rows(label, options.size_mb)?;

        let file = open_dataset_file(label, &path)?;
        debug!(
            "Opened {} (batch rows: {:?}, row cap: {:?})",
            path.display(),
            batch_rows,
            options.nrows
        );
        Self::from_reader(file, columns, batch_rows, options.nrows)
    }
}

impl<R: Read> ChunkSource<R> {
    /// Wrap any reader producing CSV text with a header row.
    ///
    /// `batch_rows = None` means one batch holding everything (up to
    /// `row_cap`). Fails with [`ClickstreamError::MissingColumn`] when the
    /// header lacks a requested column.
    pub fn from_reader(
        reader: R,
        columns: &[Column],
        batch_rows: Option<usize>,
        row_cap: Option<u64>,
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let projection = columns
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|h| h.trim() == column.name())
                    .map(|idx| (*column, idx))
                    .ok_or_else(|| ClickstreamError::MissingColumn(column.name().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            reader,
            projection,
            batch_rows: batch_rows.filter(|n| *n > 0),
            row_cap,
            rows_read: 0,
            batches_emitted: 0,
            record: csv::StringRecord::new(),
            finished: false,
        })
    }

    /// Rows decoded so far across all batches.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn next_batch(&mut self) -> Result<Option<Batch>> {
        if self.finished {
            return Ok(None);
        }

        let limit = self.batch_rows.unwrap_or(usize::MAX);
        let mut records = Vec::with_capacity(limit.min(MAX_PREALLOCATED_ROWS));

        while records.len() < limit {
            if self.row_cap.is_some_and(|cap| self.rows_read >= cap) {
                self.finished = true;
                break;
            }
            if !self.reader.read_record(&mut self.record)? {
                self.finished = true;
                break;
            }
            let line = self.record.position().map(|p| p.line()).unwrap_or_default();
            records.push(decode_record(&self.projection, &self.record, line)?);
            self.rows_read += 1;
        }

        if records.is_empty() {
            self.finished = true;
            return Ok(None);
        }

        let batch = Batch {
            index: self.batches_emitted,
            records,
        };
        self.batches_emitted += 1;
        Ok(Some(batch))
    }
}

impl<R: Read> Iterator for ChunkSource<R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(batch) => batch.map(Ok),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// ── Precomputed summaries ─────────────────────────────────────────────────────

/// One row of a `<label>.csv.rq2.csv` purchase summary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryRow {
    pub category: String,
    pub n_purchases: u64,
}

/// Read a purchase summary file produced outside this tool.
pub fn read_summary(label: &str, path: &Path) -> Result<Vec<SummaryRow>> {
    let file = open_dataset_file(label, path)?;
    let mut reader = csv::Reader::from_reader(file);
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SummaryRow>, csv::Error>>()?;
    debug!("Read {} summary rows from {}", rows.len(), path.display());
    Ok(rows)
}

// ── Dataset discovery ─────────────────────────────────────────────────────────

/// Find all `.csv` datasets directly under `data_dir`, sorted by label.
///
/// Derived summaries (`*.csv.rq2.csv`) are skipped.
pub fn find_dataset_files(data_dir: &Path) -> Vec<(String, PathBuf)> {
    if !data_dir.exists() {
        warn!("Data directory does not exist: {}", data_dir.display());
        return Vec::new();
    }

    let mut files: Vec<(String, PathBuf)> = walkdir::WalkDir::new(data_dir)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            let label = name.strip_suffix(".csv")?;
            if label.contains(".csv") {
                return None;
            }
            Some((label.to_string(), entry.into_path()))
        })
        .collect();

    files.sort();
    files
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open_dataset_file(label: &str, path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ClickstreamError::DatasetNotFound {
            label: label.to_string(),
            path: path.to_path_buf(),
        },
        _ => ClickstreamError::Io(e),
    })
}

/// Coerce the projected cells of one CSV row into an [`EventRecord`].
fn decode_record(
    projection: &[(Column, usize)],
    record: &csv::StringRecord,
    line: u64,
) -> Result<EventRecord> {
    let mut event = EventRecord::default();

    for (column, idx) in projection {
        let cell = record.get(*idx).unwrap_or_default();
        match column {
            Column::EventTime => event.event_time = Some(parse_event_time(cell)?),
            Column::EventType => event.event_type = EventType::from(cell),
            Column::ProductId => {
                event.product_id = cell
                    .trim()
                    .parse()
                    .map_err(|_| coercion_error(line, *column, cell))?
            }
            Column::Price => {
                // Prices are finite and non-negative; "NaN" and "inf" parse as f64.
                event.price = cell
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite() && *p >= 0.0)
                    .ok_or_else(|| coercion_error(line, *column, cell))?
            }
            Column::UserSession => event.user_session = cell.to_string(),
            Column::CategoryCode => event.category_code = cell.to_string(),
            Column::Brand => event.brand = cell.to_string(),
        }
    }

    Ok(event)
}

fn coercion_error(line: u64, column: Column, value: &str) -> ClickstreamError {
    ClickstreamError::Coercion {
        line,
        column: column.name(),
        value: value.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
