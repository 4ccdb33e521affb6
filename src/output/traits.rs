//! Output writer trait and shared types
//!
//! This module defines the interface for record writers and the batch of
//! run results they receive.

use crate::config::{Action, OutputFormat};
use crate::extract::EventRecord;
use crate::state::RunReport;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Results of one run, as handed to the writers
#[derive(Debug, Clone, Copy)]
pub struct OutputBatch<'a> {
    pub records: &'a [EventRecord],
    pub source_url: &'a Url,
    pub action: Action,
    pub report: &'a RunReport,
    /// Stamp shared by every file of the run
    pub generated_at: DateTime<Utc>,
}

impl OutputBatch<'_> {
    /// `YYYYmmdd_HHMMSS`, used in file names
    pub fn timestamp(&self) -> String {
        self.generated_at.format("%Y%m%d_%H%M%S").to_string()
    }
}

/// Writes a batch of records in one format
pub trait OutputWriter {
    fn format(&self) -> OutputFormat;

    /// File name (without directory) for the batch
    fn file_name(&self, batch: &OutputBatch<'_>) -> String;

    /// Renders the file contents
    fn render(&self, batch: &OutputBatch<'_>) -> OutputResult<String>;

    /// Renders the batch and writes it into `dir`
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(OutputError)` - Rendering or writing failed
    fn write(&self, batch: &OutputBatch<'_>, dir: &Path) -> OutputResult<PathBuf> {
        let contents = self.render(batch)?;
        let path = dir.join(self.file_name(batch));
        fs::write(&path, contents)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let report = crate::state::RunProgress::new(0).snapshot();
        let url = Url::parse("https://ticketsibiza.com/events").unwrap();
        let batch = OutputBatch {
            records: &[],
            source_url: &url,
            action: Action::Crawl,
            report: &report,
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 5, 3).unwrap(),
        };
        assert_eq!(batch.timestamp(), "20250601_090503");
    }
}
