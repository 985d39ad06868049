use anyhow::Context;
use clickstream_core::datasets::DatasetCatalog;
use clickstream_core::settings::{LogLevel, Settings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Filter for the global subscriber, built from `--log-level`.
pub fn log_filter(log_level: LogLevel) -> EnvFilter {
    EnvFilter::new(log_level.directive())
}

/// Initialise the global `tracing` subscriber.
///
/// Log lines go to stderr so report output on stdout stays clean.
pub fn setup_logging(log_level: LogLevel) -> anyhow::Result<()> {
    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(log_filter(log_level))
        .with(subscriber)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(())
}

// ── Catalog bootstrap ──────────────────────────────────────────────────────────

/// Built-in dataset metadata, merged with `--catalog` when given.
pub fn load_catalog(settings: &Settings) -> anyhow::Result<DatasetCatalog> {
    let catalog = match &settings.catalog {
        Some(path) => DatasetCatalog::with_overrides_from(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => DatasetCatalog::builtin(),
    };
    Ok(catalog.strict(settings.strict_labels))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
