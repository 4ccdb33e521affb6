use crate::state::WalkState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Progress is logged every this many processed URLs
const LOG_EVERY: usize = 10;

/// Percent marks at which progress is logged regardless of `LOG_EVERY`
const LOG_MARKS: &[usize] = &[25, 50, 75];

/// Categories of per-URL and per-run failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    /// A fetch+extract call exceeded its timeout
    FetchTimeout,
    /// Network or render failure
    FetchError,
    /// The server answered with an error status
    HttpStatusError,
    /// The page was fetched but no strategy found a title
    NoDataExtracted,
    /// Listing navigation structure was missing or unreachable
    PaginationAborted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchTimeout => "FetchTimeout",
            Self::FetchError => "FetchError",
            Self::HttpStatusError => "HttpStatusError",
            Self::NoDataExtracted => "NoDataExtracted",
            Self::PaginationAborted => "PaginationAborted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured failure entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub url: String,
    #[serde(rename = "error_type")]
    pub kind: ErrorKind,
    #[serde(rename = "error_message")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Why a run produced the records it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Diagnosis {
    /// At least one record was produced
    RecordsProduced,
    /// Discovery found nothing to extract
    NoDetailUrlsDiscovered,
    /// URLs were found but every extraction failed
    AllExtractionsFailed,
}

impl Diagnosis {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::RecordsProduced => "records produced",
            Self::NoDetailUrlsDiscovered => {
                "no detail URLs were discovered; check the listing URL and link prefix"
            }
            Self::AllExtractionsFailed => {
                "detail URLs were found but every extraction failed; check the error list"
            }
        }
    }
}

/// Summary of the pagination walk that fed a crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationSummary {
    pub pages_visited: usize,
    pub terminal_state: WalkState,
    pub abort_reason: Option<String>,
    pub detail_urls_found: usize,
}

/// Mutable counters for one executor run
///
/// Only the executor's aggregator mutates this; everyone else sees a
/// [`RunReport`] snapshot.
#[derive(Debug, Clone)]
pub struct RunProgress {
    total_urls: usize,
    processed_urls: usize,
    succeeded: usize,
    failed: usize,
    errors: Vec<ErrorRecord>,
    started: Instant,
    started_at: DateTime<Utc>,
    last_logged_mark: usize,
}

impl RunProgress {
    /// Creates progress for a run over `total_urls` URLs
    pub fn new(total_urls: usize) -> Self {
        Self {
            total_urls,
            processed_urls: 0,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
            started: Instant::now(),
            started_at: Utc::now(),
            last_logged_mark: 0,
        }
    }

    /// Grows the total when more URLs are queued mid-run
    pub fn add_total(&mut self, count: usize) {
        self.total_urls += count;
    }

    pub fn record_success(&mut self) {
        self.processed_urls += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, url: &str, kind: ErrorKind, message: impl Into<String>) {
        self.processed_urls += 1;
        self.failed += 1;
        self.push_error(url, kind, message);
    }

    /// Records an error that does not correspond to a processed URL
    pub fn record_run_error(&mut self, url: &str, kind: ErrorKind, message: impl Into<String>) {
        self.push_error(url, kind, message);
    }

    fn push_error(&mut self, url: &str, kind: ErrorKind, message: impl Into<String>) {
        self.errors.push(ErrorRecord {
            url: url.to_string(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn total_urls(&self) -> usize {
        self.total_urls
    }

    pub fn processed_urls(&self) -> usize {
        self.processed_urls
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Percentage of processed URLs that produced a record
    pub fn success_rate(&self) -> f64 {
        percent(self.succeeded, self.processed_urls)
    }

    /// Percentage of processed URLs that failed
    pub fn error_rate(&self) -> f64 {
        percent(self.failed, self.processed_urls)
    }

    pub fn avg_time_per_url(&self) -> Duration {
        if self.processed_urls == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.elapsed().as_secs_f64() / self.processed_urls as f64)
    }

    /// Returns true when the latest update crossed a logging mark
    ///
    /// Marks are every `LOG_EVERY` URLs plus the 25/50/75 percent points.
    pub fn should_log(&mut self) -> bool {
        let processed = self.processed_urls;
        if processed == 0 {
            return false;
        }

        if processed % LOG_EVERY == 0 || processed == self.total_urls {
            return true;
        }

        if self.total_urls == 0 {
            return false;
        }

        let pct = processed * 100 / self.total_urls;
        match LOG_MARKS.iter().rev().find(|mark| pct >= **mark) {
            Some(&mark) if mark > self.last_logged_mark => {
                self.last_logged_mark = mark;
                true
            }
            _ => false,
        }
    }

    /// Logs the current counters at info level
    pub fn log_progress(&self) {
        tracing::info!(
            "Progress: {}/{} processed ({} ok, {} failed, {:.1}% success, {:.2}s avg)",
            self.processed_urls,
            self.total_urls,
            self.succeeded,
            self.failed,
            self.success_rate(),
            self.avg_time_per_url().as_secs_f64()
        );
    }

    /// Takes a read-only snapshot for reporting
    pub fn snapshot(&self) -> RunReport {
        let mut error_counts: BTreeMap<String, usize> = BTreeMap::new();
        for error in &self.errors {
            *error_counts.entry(error.kind.as_str().to_string()).or_insert(0) += 1;
        }
        let unique_error_types = error_counts.keys().cloned().collect();

        let diagnosis = if self.succeeded > 0 {
            Diagnosis::RecordsProduced
        } else if self.total_urls == 0 {
            Diagnosis::NoDetailUrlsDiscovered
        } else {
            Diagnosis::AllExtractionsFailed
        };

        RunReport {
            started_at: self.started_at,
            total_urls: self.total_urls,
            processed_urls: self.processed_urls,
            succeeded: self.succeeded,
            failed: self.failed,
            success_rate: self.success_rate(),
            error_rate: self.error_rate(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            avg_time_per_url_secs: self.avg_time_per_url().as_secs_f64(),
            error_counts,
            unique_error_types,
            errors: self.errors.clone(),
            diagnosis,
            config_hash: None,
            pagination: None,
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Final, serializable report of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub total_urls: usize,
    pub processed_urls: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub error_rate: f64,
    pub elapsed_secs: f64,
    pub avg_time_per_url_secs: f64,
    pub error_counts: BTreeMap<String, usize>,
    pub unique_error_types: Vec<String>,
    pub errors: Vec<ErrorRecord>,
    pub diagnosis: Diagnosis,
    pub config_hash: Option<String>,
    pub pagination: Option<PaginationSummary>,
}

impl RunReport {
    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }

    pub fn with_pagination(mut self, summary: PaginationSummary) -> Self {
        self.pagination = Some(summary);
        self
    }
}
