//! Crawl executor
//!
//! Drives extraction of every URL in a frontier under the crawl policy:
//! - Retry with exponential backoff for transient failures
//! - A per-call timeout around each fetch+extract attempt
//! - A random delay between requests
//! - A fixed-size worker pool feeding a single aggregator

use crate::config::{
    RunConfig, BACKOFF_BASE_DEFAULT, MAX_DELAY_DEFAULT, MAX_RETRIES_DEFAULT, MIN_DELAY_DEFAULT,
};
use crate::crawler::FetchError;
use crate::extract::EventRecord;
use crate::state::{ErrorKind, RunProgress};
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use url::Url;

/// Default timeout for one fetch+extract call
const REQUEST_TIMEOUT_DEFAULT: Duration = Duration::from_secs(45);

/// Pacing, retry and concurrency settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub backoff_base: Duration,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs_f64(MIN_DELAY_DEFAULT),
            max_delay: Duration::from_secs_f64(MAX_DELAY_DEFAULT),
            max_retries: MAX_RETRIES_DEFAULT,
            concurrency: 1,
            request_timeout: REQUEST_TIMEOUT_DEFAULT,
            backoff_base: Duration::from_secs_f64(BACKOFF_BASE_DEFAULT),
        }
    }
}

impl CrawlPolicy {
    pub fn from_run(run: &RunConfig) -> Self {
        Self {
            min_delay: run.min_delay(),
            max_delay: run.max_delay(),
            max_retries: run.max_retries,
            concurrency: run.concurrency.max(1),
            request_timeout: run.request_timeout(),
            backoff_base: run.backoff_base(),
        }
    }

    /// Wait after failed attempt `attempt` (0-based): `backoff_base * 2^(attempt + 1)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .checked_mul(2u32.saturating_pow(attempt.saturating_add(1)))
            .unwrap_or(Duration::MAX)
    }

    /// Random delay drawn from `[min_delay, max_delay]`
    pub fn random_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let secs = rand::rng()
            .random_range(self.min_delay.as_secs_f64()..=self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }
}

/// Fetch+extract pipeline for a single detail URL
#[async_trait::async_trait]
pub trait DetailSource: Send + Sync {
    /// Returns the record on the page, `Ok(None)` when the page holds no event
    async fn extract_detail(&self, url: &Url) -> Result<Option<EventRecord>, FetchError>;
}

/// Sleep capability, replaceable in tests
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

#[async_trait::async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

/// Stops dispatch of new URLs for a running executor
#[derive(Debug, Clone)]
pub struct AbortHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    /// Requests the abort; in-flight calls finish or time out on their own
    pub fn abort(&self) {
        self.signal.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.signal.borrow()
    }
}

/// Records and progress accumulated by a run
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub records: Vec<EventRecord>,
    pub progress: RunProgress,
}

impl ExecutionOutcome {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            progress: RunProgress::new(0),
        }
    }
}

impl Default for ExecutionOutcome {
    fn default() -> Self {
        Self::new()
    }
}

/// Final result of one URL
#[derive(Debug)]
enum UrlOutcome {
    Record(Box<EventRecord>),
    NoData,
    Failed(FetchError),
}

/// Message from a worker to the aggregator
#[derive(Debug)]
struct Completion {
    url: Url,
    outcome: UrlOutcome,
}

/// Runs extraction over a frontier
pub struct CrawlExecutor {
    policy: CrawlPolicy,
    sleeper: Arc<dyn Sleeper>,
    abort: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for CrawlExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlExecutor")
            .field("policy", &self.policy)
            .field("aborted", &*self.abort.borrow())
            .finish()
    }
}

impl CrawlExecutor {
    pub fn new(policy: CrawlPolicy) -> Self {
        let (abort, _) = watch::channel(false);
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
            abort: Arc::new(abort),
        }
    }

    /// Replaces the sleep capability used for delays and backoff
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &CrawlPolicy {
        &self.policy
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            signal: Arc::clone(&self.abort),
        }
    }

    fn is_aborted(&self) -> bool {
        *self.abort.borrow()
    }

    /// Extracts every URL in `frontier`
    ///
    /// Individual URL failures are recorded in the progress, never returned.
    ///
    /// # Arguments
    ///
    /// * `frontier` - Detail URLs, each processed once
    /// * `source` - Fetch+extract pipeline
    ///
    /// # Returns
    ///
    /// Records in completion order plus the run progress
    pub async fn run(&self, frontier: Vec<Url>, source: Arc<dyn DetailSource>) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::new();
        self.run_into(frontier, source, &mut outcome).await;
        outcome
    }

    /// Extracts a batch of URLs, accumulating into an existing outcome
    ///
    /// Used when URLs arrive in several batches, e.g. page by page during an
    /// eager pagination walk.
    pub async fn run_into(
        &self,
        urls: Vec<Url>,
        source: Arc<dyn DetailSource>,
        outcome: &mut ExecutionOutcome,
    ) {
        if urls.is_empty() {
            return;
        }

        outcome.progress.add_total(urls.len());

        if self.is_aborted() {
            tracing::warn!("Run aborted; {} URLs not dispatched", urls.len());
            return;
        }

        // Pace the first request of a batch against the previous batch
        if outcome.progress.processed_urls() > 0 {
            let delay = self.policy.random_delay();
            tracing::trace!("Sleeping {:.2}s before next batch", delay.as_secs_f64());
            self.sleeper.sleep(delay).await;
        }

        let workers = self.policy.concurrency.clamp(1, urls.len());
        tracing::info!("Extracting {} URLs with {} worker(s)", urls.len(), workers);

        let queue = Arc::new(Mutex::new(VecDeque::from(urls)));
        let (tx, mut rx) = mpsc::channel::<Completion>(workers * 2);
        let mut tasks = JoinSet::new();

        for id in 0..workers {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                source: Arc::clone(&source),
                policy: self.policy.clone(),
                sleeper: Arc::clone(&self.sleeper),
                abort: self.abort.subscribe(),
                results: tx.clone(),
            };
            tasks.spawn(worker.run());
        }
        drop(tx);

        // Single writer: only this loop touches the progress counters
        while let Some(completion) = rx.recv().await {
            record_completion(completion, outcome);
            if outcome.progress.should_log() {
                outcome.progress.log_progress();
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Extraction worker failed: {}", e);
            }
        }

        let undispatched = queue.lock().unwrap_or_else(PoisonError::into_inner).len();
        if undispatched > 0 {
            tracing::warn!("Run aborted; {} URLs not dispatched", undispatched);
        }
    }
}

fn record_completion(completion: Completion, outcome: &mut ExecutionOutcome) {
    let url = completion.url.as_str();
    match completion.outcome {
        UrlOutcome::Record(record) => {
            outcome.progress.record_success();
            outcome.records.push(*record);
        }
        UrlOutcome::NoData => {
            tracing::warn!("No event data extracted from {}", url);
            outcome.progress.record_failure(
                url,
                ErrorKind::NoDataExtracted,
                "No extraction strategy found an event title",
            );
        }
        UrlOutcome::Failed(error) => {
            tracing::error!("Giving up on {}: {}", url, error);
            outcome
                .progress
                .record_failure(url, error.kind(), error.to_string());
        }
    }
}

struct Worker {
    id: usize,
    queue: Arc<Mutex<VecDeque<Url>>>,
    source: Arc<dyn DetailSource>,
    policy: CrawlPolicy,
    sleeper: Arc<dyn Sleeper>,
    abort: watch::Receiver<bool>,
    results: mpsc::Sender<Completion>,
}

impl Worker {
    fn next_url(&self) -> Option<Url> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn queue_is_empty(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn aborted(&self) -> bool {
        *self.abort.borrow()
    }

    async fn run(self) {
        loop {
            if self.aborted() {
                tracing::debug!("Worker {} stopping on abort", self.id);
                break;
            }

            let Some(url) = self.next_url() else {
                break;
            };

            tracing::debug!("Worker {} processing {}", self.id, url);
            let outcome =
                process_url(&url, self.source.as_ref(), &self.policy, self.sleeper.as_ref()).await;

            if self.results.send(Completion { url, outcome }).await.is_err() {
                break;
            }

            if !self.queue_is_empty() && !self.aborted() {
                let delay = self.policy.random_delay();
                tracing::trace!("Worker {} sleeping {:.2}s", self.id, delay.as_secs_f64());
                self.sleeper.sleep(delay).await;
            }
        }
    }
}

/// Fetches and extracts one URL with bounded retries
///
/// Only transient fetch failures are retried. A page without data is final.
async fn process_url(
    url: &Url,
    source: &dyn DetailSource,
    policy: &CrawlPolicy,
    sleeper: &dyn Sleeper,
) -> UrlOutcome {
    let mut attempt: u32 = 0;

    loop {
        let result = match tokio::time::timeout(policy.request_timeout, source.extract_detail(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        };

        match result {
            Ok(Some(record)) => return UrlOutcome::Record(Box::new(record)),
            Ok(None) => return UrlOutcome::NoData,
            Err(error) if error.is_transient() && attempt < policy.max_retries => {
                let wait = policy.backoff(attempt);
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}; retrying in {:.1}s",
                    attempt + 1,
                    policy.max_retries + 1,
                    url,
                    error,
                    wait.as_secs_f64()
                );
                sleeper.sleep(wait).await;
                attempt += 1;
            }
            Err(error) => return UrlOutcome::Failed(error),
        }
    }
}
