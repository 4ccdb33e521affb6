//! Run report display and the error report file

use crate::output::traits::OutputResult;
use crate::state::{ErrorRecord, RunReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// Formats a run report for the terminal
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Harvest Report ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Detail URLs: {}", report.total_urls);
    let _ = writeln!(out, "  Processed: {}", report.processed_urls);
    let _ = writeln!(out, "  Succeeded: {}", report.succeeded);
    let _ = writeln!(out, "  Failed: {}", report.failed);
    let _ = writeln!(out, "  Elapsed: {:.1}s", report.elapsed_secs);
    let _ = writeln!(out, "  Avg per URL: {:.2}s", report.avg_time_per_url_secs);
    if let Some(hash) = &report.config_hash {
        let _ = writeln!(out, "  Config hash: {}", hash);
    }
    let _ = writeln!(out);

    if let Some(pagination) = &report.pagination {
        let _ = writeln!(out, "Pagination:");
        let _ = writeln!(out, "  Listing pages visited: {}", pagination.pages_visited);
        let _ = writeln!(out, "  Detail URLs found: {}", pagination.detail_urls_found);
        let _ = writeln!(out, "  Terminal state: {}", pagination.terminal_state);
        if let Some(reason) = &pagination.abort_reason {
            let _ = writeln!(out, "  Abort reason: {}", reason);
        }
        let _ = writeln!(out);
    }

    if !report.error_counts.is_empty() {
        let _ = writeln!(out, "Error Summary:");
        // Sort kinds by count (descending)
        let mut counts: Vec<_> = report.error_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (kind, count) in counts {
            let _ = writeln!(out, "  {}: {}", kind, count);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} URLs)",
        report.success_rate, report.succeeded, report.processed_urls
    );
    let _ = writeln!(out, "Diagnosis: {}", report.diagnosis.describe());

    out
}

/// Prints a run report to stdout
pub fn print_report(report: &RunReport) {
    print!("{}", format_report(report));
}

#[derive(Serialize)]
struct ErrorSummary<'a> {
    total_errors: usize,
    error_rate: String,
    unique_error_types: &'a [String],
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    summary: ErrorSummary<'a>,
    errors: &'a [ErrorRecord],
}

/// Writes `scraping_errors_<timestamp>.json` when the run recorded errors
///
/// # Returns
///
/// * `Ok(Some(PathBuf))` - The report was written
/// * `Ok(None)` - The run had no errors, nothing written
/// * `Err(OutputError)` - Writing failed
pub fn write_error_report(
    report: &RunReport,
    dir: &Path,
    generated_at: DateTime<Utc>,
) -> OutputResult<Option<PathBuf>> {
    if report.errors.is_empty() {
        return Ok(None);
    }

    let document = ErrorReport {
        summary: ErrorSummary {
            total_errors: report.errors.len(),
            error_rate: format!("{:.1}%", report.error_rate),
            unique_error_types: &report.unique_error_types,
        },
        errors: &report.errors,
    };

    let path = dir.join(format!(
        "scraping_errors_{}.json",
        generated_at.format("%Y%m%d_%H%M%S")
    ));
    fs::write(&path, serde_json::to_string_pretty(&document)?)?;
    tracing::info!("Error report saved to {}", path.display());

    Ok(Some(path))
}
