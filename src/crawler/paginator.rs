//! Pagination walker
//!
//! Walks a listing entry point page by page, classifying detail links into a
//! [`CrawlFrontier`] until there is no next page, the next page was already
//! visited, the page bound is reached, or a page cannot be used.

use crate::crawler::executor::{CrawlExecutor, DetailSource, ExecutionOutcome};
use crate::crawler::frontier::{CrawlFrontier, VisitedPages};
use crate::crawler::parser::{parse_listing, ListingLayout};
use crate::crawler::PageFetcher;
use crate::state::{PaginationSummary, WalkState};
use crate::url::{normalize_parsed, resolve_href, LinkClassifier};
use std::sync::Arc;
use url::Url;

/// Result of a pagination walk
///
/// Both terminal states carry whatever frontier was accumulated.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    /// Detail URLs in discovery order
    pub frontier: Vec<Url>,
    /// Listing pages fetched
    pub pages_visited: usize,
    /// `Done` or `Aborted`
    pub terminal: WalkState,
    /// Why the walk aborted, when it did
    pub abort_reason: Option<String>,
}

impl WalkOutcome {
    pub fn summary(&self) -> PaginationSummary {
        PaginationSummary {
            pages_visited: self.pages_visited,
            terminal_state: self.terminal,
            abort_reason: self.abort_reason.clone(),
            detail_urls_found: self.frontier.len(),
        }
    }
}

/// Scrapes detail pages as soon as each listing page is classified
struct EagerScrape<'a> {
    executor: &'a CrawlExecutor,
    source: Arc<dyn DetailSource>,
    outcome: &'a mut ExecutionOutcome,
}

/// Sequential walker over a paged or calendared listing
pub struct PaginationWalker {
    fetcher: Arc<dyn PageFetcher>,
    layout: ListingLayout,
    classifier: LinkClassifier,
    max_pages: usize,
}

impl PaginationWalker {
    /// Creates a walker
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetch capability for listing pages
    /// * `layout` - Where anchors and the next control live
    /// * `classifier` - Detail link classifier for the site
    /// * `max_pages` - Hard bound on listing page fetches
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        layout: ListingLayout,
        classifier: LinkClassifier,
        max_pages: usize,
    ) -> Self {
        Self {
            fetcher,
            layout,
            classifier,
            max_pages: max_pages.max(1),
        }
    }

    /// Walks the listing and returns the discovered frontier
    pub async fn walk(&self, entry: &Url) -> WalkOutcome {
        self.walk_inner(entry, None).await
    }

    /// Walks the listing, extracting each page's new detail URLs into
    /// `extraction` before moving to the next page
    pub async fn walk_eager(
        &self,
        entry: &Url,
        executor: &CrawlExecutor,
        source: Arc<dyn DetailSource>,
        extraction: &mut ExecutionOutcome,
    ) -> WalkOutcome {
        self.walk_inner(
            entry,
            Some(EagerScrape {
                executor,
                source,
                outcome: extraction,
            }),
        )
        .await
    }

    async fn walk_inner(&self, entry: &Url, mut eager: Option<EagerScrape<'_>>) -> WalkOutcome {
        let frontier = CrawlFrontier::new();
        let mut visited = VisitedPages::new();
        let mut state = WalkState::Init;
        let mut pages_visited = 0usize;
        let mut abort_reason = None;

        let mut current = match normalize_parsed(entry.clone()) {
            Ok(url) => url,
            Err(e) => {
                transition(&mut state, WalkState::Aborted);
                return WalkOutcome {
                    frontier: Vec::new(),
                    pages_visited,
                    terminal: state,
                    abort_reason: Some(format!("Invalid listing URL {}: {}", entry, e)),
                };
            }
        };

        transition(&mut state, WalkState::FetchingPage);

        loop {
            if pages_visited >= self.max_pages {
                tracing::info!("Reached page bound of {}; stopping pagination", self.max_pages);
                transition(&mut state, WalkState::Done);
                break;
            }

            visited.mark(current.clone());
            pages_visited += 1;
            tracing::info!("Fetching listing page {} ({}/{})", current, pages_visited, self.max_pages);

            let html = match self
                .fetcher
                .fetch(&current, self.layout.fetch_mode, self.layout.wait_for.as_deref())
                .await
            {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!("Pagination aborted: {}", e);
                    abort_reason = Some(e.to_string());
                    transition(&mut state, WalkState::Aborted);
                    break;
                }
            };

            transition(&mut state, WalkState::ExtractingLinks);

            let page = match parse_listing(&html, &self.layout) {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Pagination aborted on {}: {}", current, e);
                    abort_reason = Some(format!("{} ({})", e, current));
                    transition(&mut state, WalkState::Aborted);
                    break;
                }
            };

            let details = self.classifier.classify(&page.hrefs, entry, &current);
            let added = frontier.extend(details);
            tracing::info!(
                "Found {} new detail URLs on {} ({} total)",
                added.len(),
                current,
                frontier.len()
            );

            if let Some(eager) = eager.as_mut() {
                eager
                    .executor
                    .run_into(added, Arc::clone(&eager.source), &mut *eager.outcome)
                    .await;
            }

            transition(&mut state, WalkState::Advancing);

            let next = page
                .next_href
                .as_deref()
                .and_then(|href| resolve_href(href, &current))
                .and_then(|url| normalize_parsed(url).ok());

            match next {
                None => {
                    tracing::info!("No next page control on {}; pagination complete", current);
                    transition(&mut state, WalkState::Done);
                    break;
                }
                Some(next) if visited.contains(&next) => {
                    tracing::info!("Next page {} already visited; pagination complete", next);
                    transition(&mut state, WalkState::Done);
                    break;
                }
                Some(next) => {
                    transition(&mut state, WalkState::FetchingPage);
                    current = next;
                }
            }
        }

        WalkOutcome {
            frontier: frontier.into_urls(),
            pages_visited,
            terminal: state,
            abort_reason,
        }
    }
}

fn transition(state: &mut WalkState, next: WalkState) {
    if !state.can_transition_to(next) {
        tracing::warn!("Unexpected walk transition {} -> {}", state, next);
    }
    tracing::trace!("Walk state {} -> {}", state, next);
    *state = next;
}
