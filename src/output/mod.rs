//! Output module for run results
//!
//! This module handles:
//! - Exporting records as JSON and Markdown
//! - Writing the error report of a run
//! - Printing the human-readable run report

mod json;
mod markdown;
mod report;
mod traits;

pub use json::JsonWriter;
pub use markdown::{format_event, format_markdown, MarkdownWriter};
pub use report::{format_report, print_report, write_error_report};
pub use traits::{OutputBatch, OutputError, OutputResult, OutputWriter};

use crate::config::OutputFormat;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the writer for a format
pub fn writer_for(format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter),
        OutputFormat::Markdown => Box::new(MarkdownWriter),
    }
}

/// Writes every result file of a run into `dir`
///
/// Record files are only written when the run produced records. The error
/// report is written whenever the run recorded errors. A failing writer is
/// logged and does not stop the others.
///
/// # Arguments
///
/// * `batch` - Records and report of the run
/// * `dir` - Output directory, created if missing
/// * `formats` - Record formats to write
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the files written
/// * `Err(OutputError)` - The output directory could not be created
pub fn write_outputs(
    batch: &OutputBatch<'_>,
    dir: &Path,
    formats: &[OutputFormat],
) -> OutputResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    if batch.records.is_empty() && batch.report.errors.is_empty() {
        tracing::info!("No events were scraped; skipping file output");
        return Ok(written);
    }

    fs::create_dir_all(dir)?;

    if batch.records.is_empty() {
        tracing::info!("No events were scraped; skipping record files");
    } else {
        for format in formats {
            let writer = writer_for(*format);
            match writer.write(batch, dir) {
                Ok(path) => {
                    tracing::info!("Saved {:?} output to {}", writer.format(), path.display());
                    written.push(path);
                }
                Err(e) => tracing::error!("Failed to write {:?} output: {}", format, e),
            }
        }
    }

    match write_error_report(batch.report, dir, batch.generated_at) {
        Ok(Some(path)) => written.push(path),
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to save error report: {}", e),
    }

    Ok(written)
}
