//! Interactive category prompt for the per-category reports.
//!
//! Reads `category[, label]` lines, checks them against the session's
//! [`CategoryCache`](crate::category_cache::CategoryCache) and runs the
//! report, giving up after [`MAX_ATTEMPTS`] tries.

use std::io::{BufRead, Write};

use clickstream_core::error::Result;
use clickstream_core::settings::CategoryReport;
use regex::Regex;

use crate::runner::{ReportResult, ReportRunner};

/// Number of lines read before the prompt gives up.
pub const MAX_ATTEMPTS: u32 = 3;

pub const PROMPT: &str = "Please enter a category (and optionally file label, comma separated): ";

/// A parsed prompt answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRequest {
    pub category: String,
    pub label: String,
}

/// Parse one answer line. Runs of whitespace collapse to one space; a
/// missing or blank label falls back to `default_label`. `None` when the
/// category part is empty.
pub fn parse_request(line: &str, default_label: &str) -> Option<CategoryRequest> {
    let re = Regex::new(r"\s+").expect("regex is valid");
    let normalized = re.replace_all(line, " ");

    let mut parts = normalized.split(',');
    let category = parts.next().unwrap_or_default().trim();
    if category.is_empty() {
        return None;
    }
    let label = parts
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(default_label);

    Some(CategoryRequest {
        category: category.to_string(),
        label: label.to_string(),
    })
}

/// Bounded retry loop around one per-category report.
pub struct CategoryPrompt<R, W> {
    input: R,
    output: W,
    default_label: String,
}

impl<R: BufRead, W: Write> CategoryPrompt<R, W> {
    pub fn new(input: R, output: W, default_label: &str) -> Self {
        Self {
            input,
            output,
            default_label: default_label.to_string(),
        }
    }

    /// Ask for a category until a report succeeds or the attempts run out.
    ///
    /// A rejected category or a missing dataset prints a message and uses up
    /// the attempt; any other report error is returned. `Ok(None)` means no
    /// attempt produced a result or the input ended.
    pub fn run(
        &mut self,
        runner: &mut ReportRunner,
        report: CategoryReport,
        top: usize,
    ) -> Result<Option<ReportResult>> {
        for attempt in 1..=MAX_ATTEMPTS {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                tracing::debug!(attempt, "prompt input closed");
                return Ok(None);
            }

            let Some(request) = parse_request(&line, &self.default_label) else {
                tracing::warn!(attempt, "empty category entered");
                writeln!(self.output, "Please enter a non-empty category")?;
                continue;
            };

            if !runner.categories().accepts(&request.label, &request.category) {
                tracing::warn!(
                    attempt,
                    category = %request.category,
                    label = %request.label,
                    "category rejected"
                );
                writeln!(
                    self.output,
                    "Could not find a matching '{}' category for '{}', please try again",
                    request.category, request.label
                )?;
                continue;
            }

            match runner.run_category(&request.label, report, &request.category, top) {
                Ok(result) => return Ok(Some(result)),
                Err(e) => {
                    let Some(label) = e.missing_label().map(str::to_string) else {
                        return Err(e);
                    };
                    writeln!(self.output, "File with a label '{}' does not exist", label)?;
                }
            }
        }

        tracing::info!(attempts = MAX_ATTEMPTS, "no category accepted");
        Ok(None)
    }

    /// Give back the writer, e.g. to inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
