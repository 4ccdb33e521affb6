//! Crawl orchestration
//!
//! This module contains the discovery and extraction pipeline, including:
//! - Page fetching with user agent rotation
//! - Listing page parsing and pagination walking
//! - Bounded, retrying extraction over the discovered frontier
//! - The top-level `harvest` run for both actions

mod executor;
mod fetcher;
mod frontier;
mod paginator;
mod parser;

pub use executor::{
    AbortHandle, CrawlExecutor, CrawlPolicy, DetailSource, ExecutionOutcome, NoSleep, Sleeper,
    TokioSleeper,
};
pub use fetcher::{
    build_http_client, FetchError, FetchMode, HttpFetcher, PageFetcher, UserAgentRotation,
};
pub use frontier::{CrawlFrontier, VisitedPages};
pub use paginator::{PaginationWalker, WalkOutcome};
pub use parser::{parse_listing, ListingLayout, ListingPage, MissingStructure};

use crate::config::{Action, RunConfig};
use crate::extract::EventRecord;
use crate::sites::{resolve_site, Site};
use crate::state::{ErrorKind, RunReport, WalkState};
use std::sync::Arc;
use url::Url;

/// Fetches a detail page the way its site requires and extracts it
#[derive(Clone)]
pub struct SiteDetailSource {
    site: Arc<dyn Site>,
    fetcher: Arc<dyn PageFetcher>,
}

impl SiteDetailSource {
    pub fn new(site: Arc<dyn Site>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { site, fetcher }
    }
}

#[async_trait::async_trait]
impl DetailSource for SiteDetailSource {
    async fn extract_detail(&self, url: &Url) -> Result<Option<EventRecord>, FetchError> {
        let detail = self.site.detail_fetch();
        let html = self
            .fetcher
            .fetch(url, detail.mode, detail.wait_for.as_deref())
            .await?;
        Ok(self.site.extract(&html, url))
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// Extracted records in completion order
    pub records: Vec<EventRecord>,
    /// Final report, including per-URL errors
    pub report: RunReport,
    /// The pagination walk, for crawl runs
    pub walk: Option<WalkOutcome>,
}

/// Runs a harvest against the live site for `run.entry_url`
///
/// Resolves the site and builds the HTTP fetcher from the run settings; only
/// those setup steps can fail.
pub async fn run_harvest(executor: &CrawlExecutor, run: &RunConfig) -> crate::Result<HarvestOutcome> {
    let site = resolve_site(&run.entry_url)?;
    let fetcher = HttpFetcher::from_settings(&run.user_agent, run.request_timeout())?;
    Ok(harvest_with(executor, run, site, Arc::new(fetcher)).await)
}

/// Runs one harvest with a default executor
///
/// See [`harvest_with`].
pub async fn harvest(
    run: &RunConfig,
    site: Arc<dyn Site>,
    fetcher: Arc<dyn PageFetcher>,
) -> HarvestOutcome {
    let executor = CrawlExecutor::new(CrawlPolicy::from_run(run));
    harvest_with(&executor, run, site, fetcher).await
}

/// Runs one harvest
///
/// `scrape` extracts the entry URL as a single detail page. `crawl` walks the
/// entry listing and then extracts every discovered detail URL, or extracts
/// page by page when the run is eager.
///
/// Per-URL failures and pagination aborts end up in the report; a run
/// always returns whatever records it produced.
///
/// # Arguments
///
/// * `executor` - Extraction executor (its abort handle stops the run)
/// * `run` - Effective run configuration
/// * `site` - Capabilities of the site the entry URL belongs to
/// * `fetcher` - Fetch capability shared by listing and detail pages
pub async fn harvest_with(
    executor: &CrawlExecutor,
    run: &RunConfig,
    site: Arc<dyn Site>,
    fetcher: Arc<dyn PageFetcher>,
) -> HarvestOutcome {
    let source: Arc<dyn DetailSource> =
        Arc::new(SiteDetailSource::new(Arc::clone(&site), Arc::clone(&fetcher)));

    tracing::info!(
        "Starting {} of {} ({})",
        run.action,
        run.entry_url,
        site.name()
    );

    // One clock for the whole run, pagination included
    let mut execution = ExecutionOutcome::new();

    let walk = match run.action {
        Action::Scrape => {
            executor
                .run_into(vec![run.entry_url.clone()], source, &mut execution)
                .await;
            None
        }
        Action::Crawl => {
            let walker = PaginationWalker::new(
                fetcher,
                site.crawl_entry().clone(),
                site.classifier().clone(),
                run.max_pages,
            );

            let walk = if run.eager {
                walker
                    .walk_eager(&run.entry_url, executor, source, &mut execution)
                    .await
            } else {
                let walk = walker.walk(&run.entry_url).await;
                tracing::info!(
                    "Discovered {} detail URLs across {} listing page(s)",
                    walk.frontier.len(),
                    walk.pages_visited
                );
                executor
                    .run_into(walk.frontier.clone(), source, &mut execution)
                    .await;
                walk
            };

            if walk.terminal == WalkState::Aborted {
                let reason = walk
                    .abort_reason
                    .clone()
                    .unwrap_or_else(|| "pagination aborted".to_string());
                execution.progress.record_run_error(
                    run.entry_url.as_str(),
                    ErrorKind::PaginationAborted,
                    reason,
                );
            }

            Some(walk)
        }
    };

    let mut report = execution
        .progress
        .snapshot()
        .with_config_hash(run.config_hash.clone());
    if let Some(walk) = &walk {
        report = report.with_pagination(walk.summary());
    }

    tracing::info!(
        "Finished {}: {} record(s), {} failure(s)",
        run.action,
        report.succeeded,
        report.failed
    );

    HarvestOutcome {
        records: execution.records,
        report,
        walk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use crate::extract::ExtractionMethod;
    use crate::{ConfigError, HarvestError};
    use crate::state::Diagnosis;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct MapFetcher {
        pages: HashMap<String, String>,
        latency: std::time::Duration,
    }

    impl MapFetcher {
        fn with(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn with_latency(mut self, latency: std::time::Duration) -> Self {
            self.latency = latency;
            self
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &Url, _mode: FetchMode, _wait_for: Option<&str>) -> Result<String, FetchError> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn run(action: Action, entry: &str) -> RunConfig {
        let mut run = RunConfig::from_config(action, Url::parse(entry).unwrap(), &HarvestConfig::default());
        run.config_hash = Some("abc123".to_string());
        run
    }

    fn quiet_executor(run: &RunConfig) -> CrawlExecutor {
        CrawlExecutor::new(CrawlPolicy::from_run(run)).with_sleeper(Arc::new(NoSleep))
    }

    const DETAIL: &str = r#"<html><body><h1 class="entry-title">ANTS</h1></body></html>"#;

    #[tokio::test]
    async fn test_scrape_single_page() {
        let run = run(Action::Scrape, "https://ticketsibiza.com/event/ants/");
        let site = resolve_site(&run.entry_url).unwrap();
        let fetcher = Arc::new(MapFetcher::default().with("https://ticketsibiza.com/event/ants/", DETAIL));

        let outcome = harvest_with(&quiet_executor(&run), &run, site, fetcher).await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].extraction_method, ExtractionMethod::HtmlFallback);
        assert_eq!(outcome.report.config_hash.as_deref(), Some("abc123"));
        assert!(outcome.walk.is_none());
        assert!(outcome.report.pagination.is_none());
    }

    #[tokio::test]
    async fn test_harvest_with_default_executor() {
        // A single URL never waits between requests
        let run = run(Action::Scrape, "https://ticketsibiza.com/event/ants/");
        let site = resolve_site(&run.entry_url).unwrap();
        let fetcher = Arc::new(MapFetcher::default().with("https://ticketsibiza.com/event/ants/", DETAIL));

        let outcome = harvest(&run, site, fetcher).await;
        assert_eq!(outcome.report.succeeded, 1);
    }

    #[tokio::test]
    async fn test_run_harvest_rejects_unknown_site() {
        let run = run(Action::Scrape, "https://example.com/event/ants/");

        let result = run_harvest(&quiet_executor(&run), &run).await;

        assert!(matches!(
            result,
            Err(HarvestError::Config(ConfigError::UnknownSite { ref hostname })) if hostname == "example.com"
        ));
    }

    #[tokio::test]
    async fn test_scrape_no_data() {
        let run = run(Action::Scrape, "https://ticketsibiza.com/event/empty/");
        let site = resolve_site(&run.entry_url).unwrap();
        let fetcher = Arc::new(
            MapFetcher::default().with("https://ticketsibiza.com/event/empty/", "<html><body></body></html>"),
        );

        let outcome = harvest_with(&quiet_executor(&run), &run, site, fetcher).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.report.failed, 1);
        assert_eq!(outcome.report.unique_error_types, vec!["NoDataExtracted".to_string()]);
        assert_eq!(outcome.report.diagnosis, Diagnosis::AllExtractionsFailed);
    }

    #[tokio::test]
    async fn test_crawl_walks_then_extracts() {
        let listing = r#"<html><body>
            <a class="tribe-events-calendar-list__event-title-link" href="/event/ants/">ANTS</a>
            <a class="tribe-events-calendar-list__event-title-link" href="/event/missing/">Gone</a>
        </body></html>"#;
        let run = run(Action::Crawl, "https://ticketsibiza.com/events/list");
        let site = resolve_site(&run.entry_url).unwrap();
        let fetcher = Arc::new(
            MapFetcher::default()
                .with("https://ticketsibiza.com/events/list", listing)
                .with("https://ticketsibiza.com/event/ants", DETAIL),
        );

        let outcome = harvest_with(&quiet_executor(&run), &run, site, fetcher).await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.report.total_urls, 2);
        assert_eq!(outcome.report.failed, 1);
        let pagination = outcome.report.pagination.unwrap();
        assert_eq!(pagination.pages_visited, 1);
        assert_eq!(pagination.terminal_state, WalkState::Done);
        assert_eq!(pagination.detail_urls_found, 2);
    }

    #[tokio::test]
    async fn test_crawl_elapsed_includes_pagination() {
        let listing = r#"<html><body>
            <a class="tribe-events-calendar-list__event-title-link" href="/event/ants/">ANTS</a>
        </body></html>"#;
        let run = run(Action::Crawl, "https://ticketsibiza.com/events/list");
        let site = resolve_site(&run.entry_url).unwrap();
        let fetcher = Arc::new(
            MapFetcher::default()
                .with("https://ticketsibiza.com/events/list", listing)
                .with("https://ticketsibiza.com/event/ants", DETAIL)
                .with_latency(std::time::Duration::from_millis(60)),
        );

        let outcome = harvest_with(&quiet_executor(&run), &run, site, fetcher).await;

        // One listing fetch plus one detail fetch
        assert_eq!(outcome.report.succeeded, 1);
        assert!(outcome.report.elapsed_secs >= 0.12);
    }

    #[tokio::test]
    async fn test_crawl_with_unreachable_entry() {
        let run = run(Action::Crawl, "https://ticketsibiza.com/events/list");
        let site = resolve_site(&run.entry_url).unwrap();

        let outcome = harvest_with(&quiet_executor(&run), &run, site, Arc::new(MapFetcher::default())).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.report.total_urls, 0);
        assert_eq!(outcome.report.diagnosis, Diagnosis::NoDetailUrlsDiscovered);
        assert_eq!(outcome.report.unique_error_types, vec!["PaginationAborted".to_string()]);
        assert_eq!(outcome.walk.unwrap().terminal, WalkState::Aborted);
    }
}
