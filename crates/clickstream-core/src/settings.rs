use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::datasets::{SourceOptions, DEFAULT_LABEL, DEFAULT_SIZE_MB};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Descriptive statistics over e-commerce clickstream logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "clickstream",
    about = "Descriptive statistics over e-commerce clickstream logs",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: ReportCommand,

    /// Dataset label; selects `<data-dir>/<label>.csv` and its catalog entry
    #[arg(short = 'l', long, global = true, default_value = DEFAULT_LABEL)]
    pub df_label: String,

    /// Read from the object-store path instead of the local data directory
    #[arg(long, global = true)]
    pub aws: bool,

    /// Megabytes to hold resident per batch (0 reads everything at once)
    #[arg(long, visible_alias = "mb", global = true, default_value_t = DEFAULT_SIZE_MB)]
    pub size_mb: f64,

    /// Hard cap on the number of rows read
    #[arg(long, global = true)]
    pub nrows: Option<u64>,

    /// Directory holding the `<label>.csv` files
    #[arg(long, global = true, env = "CLICKSTREAM_DATA_DIR", default_value = "datasets")]
    pub data_dir: PathBuf,

    /// JSON file with extra dataset metadata (`{"label": {"total_n_rows": .., "total_size_mb": ..}}`)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Treat labels missing from the catalog as an error
    #[arg(long, global = true)]
    pub strict_labels: bool,

    /// Logging level
    #[arg(long, global = true, value_enum, ignore_case = true, default_value = "INFO")]
    pub log_level: LogLevel,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// One subcommand per report.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ReportCommand {
    /// Distinct event types present in the log
    EventTypes,
    /// Share of viewed session/product pairs that ended in a purchase
    FunnelRate,
    /// Average number of views, carts and purchases per session
    RepeatedOperations,
    /// Average number of views before a product is added to the cart
    ViewsBeforeCart,
    /// Probability that a product added to the cart is bought
    CartToPurchase,
    /// Average time an item stays in the cart before being purchased
    CartToPurchaseTime,
    /// Average time from the first view to a cart or purchase
    ViewToActionTime,
    /// Number of sold products per top-level category
    TrendingCategories,
    /// Trending categories from a precomputed `<label>.csv.rq2.csv` summary
    TrendingFromSummary,
    /// Most visited sub-categories
    VisitedSubcategories {
        /// Number of sub-categories to show (0 shows all)
        #[arg(long, default_value_t = 10)]
        top_n: usize,
        /// Keep this many sub-category levels below the top category
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Distinct top-level categories
    Categories,
    /// Most sold products of a category
    SoldProducts(CategoryArgs),
    /// Average price of the products sold by each brand of a category
    BrandPrices(CategoryArgs),
    /// Brand with the highest average prices in a category
    TopBrand(CategoryArgs),
    /// Dataset files found in the data directory
    Datasets,
}

/// Accepted `--log-level` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
}

impl LogLevel {
    /// The matching `tracing` filter directive.
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Arguments shared by the per-category reports.
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct CategoryArgs {
    /// Top-level category; prompts interactively when omitted
    pub category: Option<String>,
    /// Number of entries to report
    #[arg(long)]
    pub top_n: Option<usize>,
    /// List categories first so prompted input can be validated
    #[arg(long)]
    pub preload_categories: bool,
}

/// Which per-category report a prompt feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryReport {
    SoldProducts,
    BrandPrices,
    TopBrand,
}

impl CategoryReport {
    /// Entries reported when `--top-n` is not given.
    pub fn default_top_n(&self) -> usize {
        match self {
            CategoryReport::SoldProducts | CategoryReport::BrandPrices => 10,
            CategoryReport::TopBrand => 1,
        }
    }
}

impl ReportCommand {
    /// The per-category report and its arguments, if this is one.
    pub fn category_report(&self) -> Option<(CategoryReport, &CategoryArgs)> {
        match self {
            ReportCommand::SoldProducts(args) => Some((CategoryReport::SoldProducts, args)),
            ReportCommand::BrandPrices(args) => Some((CategoryReport::BrandPrices, args)),
            ReportCommand::TopBrand(args) => Some((CategoryReport::TopBrand, args)),
            _ => None,
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and resolve derived values.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    /// Apply the `--debug` flag.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = LogLevel::Debug;
        }
        settings
    }

    /// Reader options derived from the global flags.
    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            data_dir: self.data_dir.clone(),
            remote: self.aws,
            size_mb: Some(self.size_mb).filter(|mb| *mb > 0.0),
            nrows: self.nrows,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
