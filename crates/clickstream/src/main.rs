mod bootstrap;

use std::io::{self, Write};

use anyhow::Result;
use clickstream_core::settings::{ReportCommand, Settings};
use clickstream_runtime::prompt::CategoryPrompt;
use clickstream_runtime::runner::{top_of, ReportResult, ReportRunner};
use clickstream_ui::summary::render_report;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(settings.log_level)?;

    tracing::info!("clickstream v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        label = %settings.df_label,
        size_mb = settings.size_mb,
        nrows = ?settings.nrows,
        "settings loaded"
    );

    let catalog = bootstrap::load_catalog(&settings)?;
    let mut runner = ReportRunner::new(settings.source_options(), catalog);

    let outcome = match settings.command.category_report() {
        Some((report, args)) if args.category.is_none() => {
            if args.preload_categories {
                let listed = runner.run(&settings.df_label, &ReportCommand::Categories)?;
                print_result(&listed)?;
            }
            let stdin = io::stdin();
            let mut prompt = CategoryPrompt::new(stdin.lock(), io::stdout(), &settings.df_label);
            prompt.run(&mut runner, report, top_of(report, args))
        }
        _ => runner.run(&settings.df_label, &settings.command).map(Some),
    };

    match outcome {
        Ok(Some(result)) => print_result(&result)?,
        Ok(None) => tracing::info!("no report produced"),
        Err(e) => match e.missing_label() {
            Some(label) => println!("File with a label '{}' does not exist", label),
            None => return Err(e.into()),
        },
    }

    Ok(())
}

fn print_result(result: &ReportResult) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", render_report(&result.label, &result.output))?;
    out.flush()?;
    Ok(())
}
