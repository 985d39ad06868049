//! Runs one report against one dataset.
//!
//! [`ReportRunner`] resolves the dataset label to a [`ChunkSource`] with
//! the columns the report needs, hands the batches to the report and keeps
//! the category cache the interactive prompt reads from.

use std::fs::File;
use std::time::Instant;

use clickstream_core::datasets::{DatasetCatalog, SourceOptions};
use clickstream_core::error::{ClickstreamError, Result};
use clickstream_core::models::Column;
use clickstream_core::settings::{CategoryArgs, CategoryReport, ReportCommand};
use clickstream_data::reader::{find_dataset_files, read_summary, ChunkSource};
use clickstream_data::reports::{self, DatasetListing, ReportOutput};

use crate::category_cache::CategoryCache;

/// Suffix of the precomputed purchase summary next to a dataset.
pub const SUMMARY_SUFFIX: &str = ".csv.rq2.csv";

/// A finalized report and the dataset it was computed on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportResult {
    pub label: String,
    pub output: ReportOutput,
}

pub struct ReportRunner {
    options: SourceOptions,
    catalog: DatasetCatalog,
    categories: CategoryCache,
}

impl ReportRunner {
    pub fn new(options: SourceOptions, catalog: DatasetCatalog) -> Self {
        Self {
            options,
            catalog,
            categories: CategoryCache::new(),
        }
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    pub fn categories(&self) -> &CategoryCache {
        &self.categories
    }

    /// Run `command` on the dataset behind `label`.
    ///
    /// Per-category reports need their category here; prompting for a
    /// missing one is the job of [`CategoryPrompt`](crate::prompt::CategoryPrompt).
    pub fn run(&mut self, label: &str, command: &ReportCommand) -> Result<ReportResult> {
        let Some((report, args)) = command.category_report() else {
            return self.run_dataset_report(label, command);
        };
        let category = args.category.as_deref().ok_or_else(|| {
            ClickstreamError::Config(format!("{:?} needs a category", report))
        })?;
        self.run_category(label, report, category, top_of(report, args))
    }

    fn run_dataset_report(&mut self, label: &str, command: &ReportCommand) -> Result<ReportResult> {
        let started = Instant::now();
        tracing::info!(label, ?command, "running report");

        let output = match command {
            ReportCommand::EventTypes => ReportOutput::EventTypes(
                self.scan(label, reports::EVENT_TYPE_COLUMNS, |b| reports::event_types(b))?,
            ),
            ReportCommand::FunnelRate => ReportOutput::FunnelRate(
                self.scan(label, reports::PAIR_COLUMNS, |b| reports::funnel_rate(b))?,
            ),
            ReportCommand::RepeatedOperations => ReportOutput::RepeatedOperations(
                self.scan(label, reports::SESSION_COLUMNS, |b| reports::repeated_operations(b))?,
            ),
            ReportCommand::ViewsBeforeCart => ReportOutput::ViewsBeforeCart(
                self.scan(label, reports::PAIR_COLUMNS, |b| reports::views_before_cart(b))?,
            ),
            ReportCommand::CartToPurchase => ReportOutput::CartToPurchase(
                self.scan(label, reports::PAIR_COLUMNS, |b| reports::cart_to_purchase(b))?,
            ),
            ReportCommand::CartToPurchaseTime => ReportOutput::CartToPurchaseTime(
                self.scan(label, reports::TIMING_COLUMNS, |b| reports::cart_to_purchase_time(b))?,
            ),
            ReportCommand::ViewToActionTime => ReportOutput::ViewToActionTime(
                self.scan(label, reports::TIMING_COLUMNS, |b| reports::view_to_action_time(b))?,
            ),
            ReportCommand::TrendingCategories => ReportOutput::TrendingCategories(
                self.scan(label, reports::CATEGORY_COLUMNS, |b| reports::trending_categories(b))?,
            ),
            ReportCommand::TrendingFromSummary => {
                let path = self
                    .options
                    .data_dir
                    .join(format!("{}{}", label, SUMMARY_SUFFIX));
                ReportOutput::TrendingCategories(reports::trending_from_summary(read_summary(
                    label, &path,
                )?))
            }
            ReportCommand::VisitedSubcategories { top_n, depth } => {
                let visits = self.scan(label, reports::CATEGORY_COLUMNS, |b| {
                    reports::visited_subcategories(b, Some(*top_n), *depth)
                })?;
                ReportOutput::VisitedSubcategories {
                    top_n: Some(*top_n).filter(|n| *n > 0),
                    visits,
                }
            }
            ReportCommand::Categories => {
                let names =
                    self.scan(label, reports::CATEGORY_LIST_COLUMNS, |b| reports::categories(b))?;
                self.categories.insert(label, names.clone());
                ReportOutput::Categories(names)
            }
            ReportCommand::Datasets => ReportOutput::Datasets(self.list_datasets()),
            ReportCommand::SoldProducts(_)
            | ReportCommand::BrandPrices(_)
            | ReportCommand::TopBrand(_) => {
                return Err(ClickstreamError::Config(format!(
                    "{:?} is a per-category report",
                    command
                )))
            }
        };

        tracing::info!(
            label,
            report = output.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report finished"
        );
        Ok(ReportResult {
            label: label.to_string(),
            output,
        })
    }

    /// Run a per-category report for `category` with `top` entries.
    pub fn run_category(
        &mut self,
        label: &str,
        report: CategoryReport,
        category: &str,
        top: usize,
    ) -> Result<ReportResult> {
        let started = Instant::now();
        tracing::info!(label, category, top, ?report, "running category report");

        let output = match report {
            CategoryReport::SoldProducts => ReportOutput::SoldProducts(self.scan(
                label,
                reports::SOLD_PRODUCT_COLUMNS,
                |batches| reports::sold_products(batches, category, top),
            )?),
            CategoryReport::BrandPrices => ReportOutput::BrandPrices {
                category: category.to_string(),
                top_n: Some(top).filter(|n| *n > 0),
                prices: self.scan(label, reports::BRAND_PURCHASE_COLUMNS, |batches| {
                    reports::brand_prices(batches, category, Some(top))
                })?,
            },
            CategoryReport::TopBrand => ReportOutput::TopBrand {
                category: category.to_string(),
                brands: self.scan(label, reports::BRAND_COLUMNS, |batches| {
                    reports::top_brands(batches, category, top)
                })?,
            },
        };

        tracing::info!(
            label,
            report = output.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report finished"
        );
        Ok(ReportResult {
            label: label.to_string(),
            output,
        })
    }

    /// Open `label` with `columns` and feed its batches to `report`.
    fn scan<T>(
        &self,
        label: &str,
        columns: &[Column],
        report: impl FnOnce(&mut ChunkSource<File>) -> Result<T>,
    ) -> Result<T> {
        let mut source = ChunkSource::open(label, columns, &self.options, &self.catalog)?;
        let value = report(&mut source)?;
        tracing::info!(label, rows = source.rows_read(), "dataset scanned");
        Ok(value)
    }

    fn list_datasets(&self) -> Vec<DatasetListing> {
        find_dataset_files(&self.options.data_dir)
            .into_iter()
            .map(|(label, path)| {
                let info = self.catalog.get(&label).copied();
                DatasetListing { label, path, info }
            })
            .collect()
    }
}

/// Entries to report: `--top-n` when given, the report's default otherwise.
pub fn top_of(report: CategoryReport, args: &CategoryArgs) -> usize {
    args.top_n.unwrap_or_else(|| report.default_top_n())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    const HEADER: &str = "event_time,event_type,product_id,category_id,category_code,brand,price,user_id,user_session";

    const ROWS: &[&str] = &[
        "2019-10-01 10:00:00 UTC,view,1,9,electronics.smartphone,apple,900.0,7,s1",
        "2019-10-01 10:01:00 UTC,cart,1,9,electronics.smartphone,apple,900.0,7,s1",
        "2019-10-01 10:03:00 UTC,purchase,1,9,electronics.smartphone,apple,900.0,7,s1",
        "2019-10-01 10:04:00 UTC,view,2,9,electronics.audio,sony,200.0,7,s1",
        "2019-10-01 11:00:00 UTC,view,3,9,apparel.shoes,nike,80.0,8,s2",
        "2019-10-01 11:02:00 UTC,purchase,3,9,apparel.shoes,nike,80.0,8,s2",
        "2019-10-01 11:05:00 UTC,view,4,9,,,5.0,8,s2",
    ];

    fn write_dataset(dir: &Path, label: &str) {
        let mut content = String::from(HEADER);
        for row in ROWS {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        std::fs::write(dir.join(format!("{}.csv", label)), content).unwrap();
    }

    fn runner(dir: &TempDir) -> ReportRunner {
        let mut catalog = DatasetCatalog::builtin();
        catalog
            .merge_json(r#"{"tiny": {"total_n_rows": 7, "total_size_mb": 3}}"#)
            .unwrap();
        let options = SourceOptions {
            data_dir: dir.path().to_path_buf(),
            size_mb: Some(1.0),
            ..Default::default()
        };
        ReportRunner::new(options, catalog)
    }

    fn category_args(category: Option<&str>) -> CategoryArgs {
        CategoryArgs {
            category: category.map(str::to_string),
            top_n: None,
            preload_categories: false,
        }
    }

    // ── run ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_run_funnel_rate_in_batches() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path(), "tiny");
        let mut runner = runner(&dir);

        let result = runner.run("tiny", &ReportCommand::FunnelRate).unwrap();
        assert_eq!(result.label, "tiny");
        match result.output {
            ReportOutput::FunnelRate(rate) => {
                // Purchases: (s1,1) (s2,3). Views: (s1,1) (s1,2) (s2,3) (s2,4).
                assert_eq!((rate.complete, rate.pairs, rate.rate_percent), (2, 4, 50));
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_run_categories_fills_cache() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path(), "tiny");
        let mut runner = runner(&dir);
        assert!(runner.categories().is_empty());

        let result = runner.run("tiny", &ReportCommand::Categories).unwrap();
        assert_eq!(
            result.output,
            ReportOutput::Categories(vec!["apparel".to_string(), "electronics".to_string()])
        );
        assert!(runner.categories().accepts("tiny", "apparel"));
        assert!(!runner.categories().accepts("tiny", "toys"));
    }

    #[test]
    fn test_run_missing_dataset_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut runner = runner(&dir);
        let err = runner.run("2019-Oct", &ReportCommand::EventTypes).unwrap_err();
        assert_eq!(err.missing_label(), Some("2019-Oct"));
    }

    #[test]
    fn test_run_category_report_without_category_is_config_error() {
        let dir = TempDir::new().unwrap();
        let mut runner = runner(&dir);
        let err = runner
            .run("tiny", &ReportCommand::SoldProducts(category_args(None)))
            .unwrap_err();
        assert!(matches!(err, ClickstreamError::Config(_)));
    }

    #[test]
    fn test_run_top_brand_uses_default_top() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path(), "tiny");
        let mut runner = runner(&dir);

        let result = runner
            .run("tiny", &ReportCommand::TopBrand(category_args(Some("electronics"))))
            .unwrap();
        assert_eq!(
            result.output,
            ReportOutput::TopBrand {
                category: "electronics".to_string(),
                brands: vec!["apple".to_string()],
            }
        );
    }

    #[test]
    fn test_run_trending_from_summary() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("tiny.csv.rq2.csv"),
            "category,n_purchases\nelectronics.audio,2\nelectronics.smartphone,3\napparel.shoes,4\n",
        )
        .unwrap();
        let mut runner = runner(&dir);

        let result = runner.run("tiny", &ReportCommand::TrendingFromSummary).unwrap();
        assert_eq!(
            result.output,
            ReportOutput::TrendingCategories(vec![
                ("electronics".to_string(), 5),
                ("apparel".to_string(), 4),
            ])
        );
    }

    #[test]
    fn test_run_datasets_lists_files_with_catalog_info() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path(), "tiny");
        write_dataset(dir.path(), "other");
        let mut runner = runner(&dir);

        let result = runner.run("tiny", &ReportCommand::Datasets).unwrap();
        let ReportOutput::Datasets(listing) = result.output else {
            panic!("expected a dataset listing");
        };
        let labels: Vec<&str> = listing.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["other", "tiny"]);
        assert!(listing[0].info.is_none());
        assert_eq!(listing[1].info.and_then(|i| i.total_n_rows), Some(7));
    }

    #[test]
    fn test_top_of_prefers_explicit_value() {
        let mut args = category_args(Some("x"));
        assert_eq!(top_of(CategoryReport::SoldProducts, &args), 10);
        args.top_n = Some(3);
        assert_eq!(top_of(CategoryReport::SoldProducts, &args), 3);
    }
}
