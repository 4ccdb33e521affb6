//! ticketsibiza.com
//!
//! Static pages built on a WordPress events calendar. Detail pages usually
//! carry JSON-LD, so the standard chain rarely reaches the selector fallback.

use crate::crawler::{FetchMode, ListingLayout};
use crate::extract::{EventRecord, FallbackSelectors, RecordExtractor};
use crate::sites::{DetailFetch, Site};
use crate::url::LinkClassifier;
use url::Url;

const DETAIL_PREFIX: &str = "/event/";

#[derive(Debug)]
pub struct TicketsIbiza {
    extractor: RecordExtractor,
    classifier: LinkClassifier,
    layout: ListingLayout,
}

impl TicketsIbiza {
    pub fn new() -> Self {
        let fallback = FallbackSelectors::default()
            .with_title(&["h1.entry-title", "h1.tribe-events-single-event-title"])
            .with_venue(&[".tribe-venue", ".tribe-events-venue-details a"])
            .with_date(&[".tribe-event-date-start", ".tribe-events-schedule h2"])
            .with_time(&[".tribe-event-time"])
            .with_price(&[".tribe-events-cost", ".tribe-events-event-cost"])
            .with_description(&[".tribe-events-single-event-description", ".entry-content"])
            .with_promoter(&[".tribe-organizer"]);

        Self {
            extractor: RecordExtractor::standard(fallback),
            classifier: LinkClassifier::new(DETAIL_PREFIX),
            layout: ListingLayout {
                anchor_selector: "a.tribe-events-calendar-list__event-title-link".to_string(),
                next_selector: Some("a.tribe-events-c-nav__next".to_string()),
                required_selector: None,
                fetch_mode: FetchMode::Static,
                wait_for: None,
            },
        }
    }
}

impl Default for TicketsIbiza {
    fn default() -> Self {
        Self::new()
    }
}

impl Site for TicketsIbiza {
    fn name(&self) -> &'static str {
        "ticketsibiza"
    }

    fn extract(&self, html: &str, source_url: &Url) -> Option<EventRecord> {
        self.extractor.extract(html, source_url)
    }

    fn classifier(&self) -> &LinkClassifier {
        &self.classifier
    }

    fn crawl_entry(&self) -> &ListingLayout {
        &self.layout
    }

    fn detail_fetch(&self) -> DetailFetch {
        DetailFetch {
            mode: FetchMode::Static,
            wait_for: None,
        }
    }
}
