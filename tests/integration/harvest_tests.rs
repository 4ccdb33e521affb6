//! Integration tests for complete harvest runs
//!
//! These tests use wiremock to serve listing and event pages and run the
//! whole pipeline: walk, extract with retries, report, and write outputs.

use event_harvester::config::{Action, HarvestConfig, OutputFormat, RunConfig, UserAgentSettings};
use event_harvester::crawler::{harvest_with, CrawlExecutor, CrawlPolicy, HttpFetcher, NoSleep};
use event_harvester::extract::ExtractionMethod;
use event_harvester::output::{write_outputs, OutputBatch};
use event_harvester::sites::{IbizaSpotlight, Site, TicketsIbiza};
use event_harvester::state::{Diagnosis, WalkState};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html")
}

fn event_page(title: &str) -> String {
    format!(
        r#"<html><head><script type="application/ld+json">
        {{"@context":"https://schema.org","@type":"MusicEvent","name":"{}",
          "startDate":"2025-07-05T23:00:00+02:00",
          "location":{{"@type":"Place","name":"Ushuaia Ibiza"}},
          "offers":{{"@type":"Offer","price":"55.00","priceCurrency":"EUR"}}}}
        </script></head><body><h1 class="entry-title">{}</h1></body></html>"#,
        title, title
    )
}

fn run_config(action: Action, entry: &str) -> RunConfig {
    let mut run = RunConfig::from_config(action, Url::parse(entry).unwrap(), &HarvestConfig::default());
    run.max_retries = 2;
    run.concurrency = 2;
    run.request_timeout = 5;
    run
}

fn fetcher() -> Arc<HttpFetcher> {
    Arc::new(
        HttpFetcher::from_settings(&UserAgentSettings::default(), Duration::from_secs(5))
            .expect("Failed to build HTTP client"),
    )
}

fn executor(run: &RunConfig) -> CrawlExecutor {
    CrawlExecutor::new(CrawlPolicy::from_run(run)).with_sleeper(Arc::new(NoSleep))
}

/// Listing with five events, two of which always fail
async fn mount_ticket_listing(server: &MockServer) {
    let listing = r#"<html><body>
        <a class="tribe-events-calendar-list__event-title-link" href="/event/ants/">ANTS</a>
        <a class="tribe-events-calendar-list__event-title-link" href="/event/glitterbox/">Glitterbox</a>
        <a class="tribe-events-calendar-list__event-title-link" href="/event/elrow/">elrow</a>
        <a class="tribe-events-calendar-list__event-title-link" href="/event/cancelled/">Cancelled</a>
        <a class="tribe-events-calendar-list__event-title-link" href="/event/broken/">Broken</a>
    </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/events/list"))
        .respond_with(html(listing))
        .mount(server)
        .await;

    for (slug, title) in [("ants", "ANTS"), ("glitterbox", "Glitterbox"), ("elrow", "elrow")] {
        Mock::given(method("GET"))
            .and(path(format!("/event/{}", slug)))
            .respond_with(html(&event_page(title)))
            .expect(1)
            .mount(server)
            .await;
    }

    // Permanent failure: not retried
    Mock::given(method("GET"))
        .and(path("/event/cancelled"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;

    // Transient failure: first attempt plus two retries
    Mock::given(method("GET"))
        .and(path("/event/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_five_urls_two_failing() {
    let server = MockServer::start().await;
    mount_ticket_listing(&server).await;

    let run = run_config(Action::Crawl, &format!("{}/events/list", server.uri()));
    let site: Arc<dyn Site> = Arc::new(TicketsIbiza::new());

    let outcome = harvest_with(&executor(&run), &run, site, fetcher()).await;

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.report.total_urls, 5);
    assert_eq!(outcome.report.succeeded, 3);
    assert_eq!(outcome.report.failed, 2);
    assert_eq!(outcome.report.errors.len(), 2);
    assert_eq!(outcome.report.diagnosis, Diagnosis::RecordsProduced);
    assert_eq!(outcome.report.error_counts.get("HttpStatusError"), Some(&2));

    let mut titles: Vec<_> = outcome.records.iter().map(|r| r.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["ANTS", "Glitterbox", "elrow"]);
    assert!(outcome
        .records
        .iter()
        .all(|r| r.extraction_method == ExtractionMethod::StructuredData && r.price_value == Some(55.0)));

    let pagination = outcome.report.pagination.unwrap();
    assert_eq!(pagination.terminal_state, WalkState::Done);
    assert_eq!(pagination.detail_urls_found, 5);
}

#[tokio::test]
async fn test_eager_crawl_matches_deferred_crawl() {
    let server = MockServer::start().await;
    mount_ticket_listing(&server).await;

    let mut run = run_config(Action::Crawl, &format!("{}/events/list", server.uri()));
    run.eager = true;
    let site: Arc<dyn Site> = Arc::new(TicketsIbiza::new());

    let outcome = harvest_with(&executor(&run), &run, site, fetcher()).await;

    assert_eq!(outcome.report.succeeded, 3);
    assert_eq!(outcome.report.failed, 2);
    assert_eq!(outcome.walk.unwrap().pages_visited, 1);
}

#[tokio::test]
async fn test_scrape_rendered_site_with_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/night/events/2025/06/circoloco"))
        .respond_with(html(
            r##"<html><head><title>Circoloco | Ibiza Spotlight</title></head><body><main><article>
              <section class="section--header"><div class="container"><h1>Circoloco</h1><h2>DC10</h2></div></section>
              <section class="section--promoter-listings"><div class="card-ticket">
                <div class="ticket-date"><a href="#">Mon 16 Jun 2025</a></div>
                <div class="ticket-time">23:00 - 06:00</div>
                <div class="ticket-price">€60</div>
              </div></section>
            </article></main></body></html>"##,
        ))
        .mount(&server)
        .await;

    let run = run_config(
        Action::Scrape,
        &format!("{}/night/events/2025/06/circoloco", server.uri()),
    );
    let site: Arc<dyn Site> = Arc::new(IbizaSpotlight::new());

    let outcome = harvest_with(&executor(&run), &run, site, fetcher()).await;

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.title, "Circoloco");
    assert_eq!(record.venue.as_deref(), Some("DC10"));
    assert_eq!(record.extraction_method, ExtractionMethod::DynamicHtml);
    assert!(outcome.walk.is_none());
}

#[tokio::test]
async fn test_empty_listing_reports_no_detail_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/night/events/2025/06"))
        .respond_with(html(
            r#"<html><body><div id="PartyCalBody">
                <a href="/night/events/2025/06/15">15</a>
                <a href="/night/events/2025/06/16">16</a>
            </div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let run = run_config(Action::Crawl, &format!("{}/night/events/2025/06", server.uri()));
    let site: Arc<dyn Site> = Arc::new(IbizaSpotlight::new());

    let outcome = harvest_with(&executor(&run), &run, site, fetcher()).await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.report.total_urls, 0);
    assert_eq!(outcome.report.diagnosis, Diagnosis::NoDetailUrlsDiscovered);
}

#[tokio::test]
async fn test_blocked_calendar_aborts_and_writes_error_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/night/events/2025/06"))
        .respond_with(html("<html><body><p>Checking your browser</p></body></html>"))
        .mount(&server)
        .await;

    let run = run_config(Action::Crawl, &format!("{}/night/events/2025/06", server.uri()));
    let site: Arc<dyn Site> = Arc::new(IbizaSpotlight::new());

    let outcome = harvest_with(&executor(&run), &run, site, fetcher()).await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.report.unique_error_types, vec!["PaginationAborted".to_string()]);
    assert_eq!(
        outcome.report.pagination.as_ref().unwrap().terminal_state,
        WalkState::Aborted
    );

    let dir = TempDir::new().unwrap();
    let batch = OutputBatch {
        records: &outcome.records,
        source_url: &run.entry_url,
        action: run.action,
        report: &outcome.report,
        generated_at: chrono::Utc::now(),
    };
    let written = write_outputs(&batch, dir.path(), &[OutputFormat::Json, OutputFormat::Markdown]).unwrap();

    assert_eq!(written.len(), 1);
    let name = written[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("scraping_errors_"));
}

#[tokio::test]
async fn test_crawl_writes_record_files() {
    let server = MockServer::start().await;
    mount_ticket_listing(&server).await;

    let run = run_config(Action::Crawl, &format!("{}/events/list", server.uri()));
    let site: Arc<dyn Site> = Arc::new(TicketsIbiza::new());
    let outcome = harvest_with(&executor(&run), &run, site, fetcher()).await;

    let dir = TempDir::new().unwrap();
    let batch = OutputBatch {
        records: &outcome.records,
        source_url: &run.entry_url,
        action: run.action,
        report: &outcome.report,
        generated_at: chrono::Utc::now(),
    };
    let written = write_outputs(&batch, dir.path(), &[OutputFormat::Json]).unwrap();
    assert_eq!(written.len(), 2);

    let json_path = written
        .iter()
        .find(|p| p.file_name().unwrap().to_string_lossy().starts_with("events_"))
        .unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(value["events"].as_array().unwrap().len(), 3);
    assert_eq!(value["action"], "crawl");
    assert_eq!(value["report"]["failed"], 2);
}
