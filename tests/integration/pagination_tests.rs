//! Integration tests for the pagination walker
//!
//! These tests use wiremock to serve listing pages and drive the walker
//! through the real HTTP fetcher.

use event_harvester::config::UserAgentSettings;
use event_harvester::crawler::{HttpFetcher, ListingLayout, PageFetcher, PaginationWalker};
use event_harvester::state::WalkState;
use event_harvester::LinkClassifier;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> Arc<dyn PageFetcher> {
    Arc::new(
        HttpFetcher::from_settings(&UserAgentSettings::default(), Duration::from_secs(5))
            .expect("Failed to build HTTP client"),
    )
}

fn layout() -> ListingLayout {
    ListingLayout {
        anchor_selector: "#listing a[href]".to_string(),
        next_selector: Some("a.next".to_string()),
        required_selector: Some("#listing".to_string()),
        ..Default::default()
    }
}

fn walker(max_pages: usize) -> PaginationWalker {
    PaginationWalker::new(fetcher(), layout(), LinkClassifier::new("/events/"), max_pages)
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

fn paths(urls: &[Url]) -> Vec<String> {
    urls.iter().map(|u| u.path().to_string()).collect()
}

#[tokio::test]
async fn test_listing_with_date_navigation_and_query_variant() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/events",
        r#"<div id="listing">
            <a href="/events/2024">2024</a>
            <a href="/events/2024/05">May</a>
            <a href="/events/my-cool-party">My Cool Party</a>
            <a href="/events/my-cool-party?ref=fb">Shared</a>
        </div>"#,
    )
    .await;

    let entry = Url::parse(&format!("{}/events", server.uri())).unwrap();
    let outcome = walker(10).walk(&entry).await;

    assert_eq!(outcome.terminal, WalkState::Done);
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(paths(&outcome.frontier), vec!["/events/my-cool-party"]);
}

#[tokio::test]
async fn test_follows_next_and_deduplicates_across_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/events",
        r#"<div id="listing">
            <a href="/events/opening-party">Opening</a>
            <a href="/events/sunset-session/">Sunset</a>
        </div>
        <a class="next" href="/events/page/2">Next</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/events/page/2",
        r#"<div id="listing">
            <a href="/events/sunset-session">Sunset again</a>
            <a href="/events/closing-party#tickets">Closing tickets</a>
            <a href="/events/closing-party">Closing</a>
        </div>"#,
    )
    .await;

    let entry = Url::parse(&format!("{}/events", server.uri())).unwrap();
    let outcome = walker(10).walk(&entry).await;

    assert_eq!(outcome.terminal, WalkState::Done);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(
        paths(&outcome.frontier),
        vec![
            "/events/opening-party",
            "/events/sunset-session",
            "/events/closing-party",
        ]
    );
}

#[tokio::test]
async fn test_next_pointing_back_stops_the_walk() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/events",
        r#"<div id="listing"><a href="/events/first">First</a></div>
        <a class="next" href="/events?week=2">Next</a>"#,
    )
    .await;

    // Week 2 links back to week 1
    Mock::given(method("GET"))
        .and(path("/events"))
        .and(query_param("week", "2"))
        .respond_with(html_page(
            r#"<div id="listing"><a href="/events/second">Second</a></div>
            <a class="next" href="/events">Next</a>"#,
        ))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let entry = Url::parse(&format!("{}/events", server.uri())).unwrap();
    let outcome = walker(10).walk(&entry).await;

    assert_eq!(outcome.terminal, WalkState::Done);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(paths(&outcome.frontier), vec!["/events/first", "/events/second"]);
}

#[tokio::test]
async fn test_page_bound_limits_fetches() {
    let server = MockServer::start().await;
    for page in 1..=6 {
        mount_page(
            &server,
            &format!("/events/page/{}", page),
            &format!(
                r#"<div id="listing"><a href="/events/party-{page}">Party {page}</a></div>
                <a class="next" href="/events/page/{next}">Next</a>"#,
                page = page,
                next = page + 1
            ),
        )
        .await;
    }

    let entry = Url::parse(&format!("{}/events/page/1", server.uri())).unwrap();
    let outcome = walker(3).walk(&entry).await;

    assert_eq!(outcome.terminal, WalkState::Done);
    assert_eq!(outcome.pages_visited, 3);
    assert_eq!(outcome.frontier.len(), 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_missing_structure_aborts_with_partial_frontier() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/events",
        r#"<div id="listing"><a href="/events/kept-party">Kept</a></div>
        <a class="next" href="/events/page/2">Next</a>"#,
    )
    .await;
    mount_page(&server, "/events/page/2", "<p>Please enable JavaScript</p>").await;

    let entry = Url::parse(&format!("{}/events", server.uri())).unwrap();
    let outcome = walker(10).walk(&entry).await;

    assert_eq!(outcome.terminal, WalkState::Aborted);
    assert!(outcome.abort_reason.unwrap().contains("#listing"));
    assert_eq!(paths(&outcome.frontier), vec!["/events/kept-party"]);
}

#[tokio::test]
async fn test_unreachable_next_page_aborts() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/events",
        r#"<div id="listing"><a href="/events/kept-party">Kept</a></div>
        <a class="next" href="/events/page/2">Next</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/events/page/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let entry = Url::parse(&format!("{}/events", server.uri())).unwrap();
    let outcome = walker(10).walk(&entry).await;

    assert_eq!(outcome.terminal, WalkState::Aborted);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.frontier.len(), 1);
    assert_eq!(outcome.summary().detail_urls_found, 1);
}
