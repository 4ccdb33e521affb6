//! ibiza-spotlight.com
//!
//! Both the party calendar and the event pages are filled in by scripts, so
//! every fetch is rendered. Listing pages are calendar weeks under
//! `/night/events/YYYY/MM`, mixed with date navigation links that share the
//! detail prefix.

use crate::crawler::{FetchMode, ListingLayout};
use crate::extract::{
    EventRecord, ExtractionStrategy, FallbackSelectors, HtmlFallbackStrategy, RecordExtractor,
    StructuredDataStrategy,
};
use crate::sites::{DetailFetch, Site};
use crate::url::LinkClassifier;
use url::Url;

const DETAIL_PREFIX: &str = "/night/events/";
const CALENDAR_BODY: &str = "#PartyCalBody";
const DETAIL_CONTENT: &str = "main article, main div.content";

#[derive(Debug)]
pub struct IbizaSpotlight {
    extractor: RecordExtractor,
    classifier: LinkClassifier,
    layout: ListingLayout,
}

fn fallback_selectors() -> FallbackSelectors {
    FallbackSelectors::default()
        .with_title(&["h1.eventTitle", "title", "h1"])
        .with_title_separator('|')
        .with_venue(&[
            ".section--header .container h2",
            ".section--header .container h1 + p",
        ])
        .with_date(&[".section--promoter-listings .card-ticket .ticket-date a"])
        .with_time(&[".section--promoter-listings .card-ticket .ticket-time"])
        .with_price(&[
            ".section--promoter-listings .card-ticket .ticket-price",
            ".section--body-text .ticket-price",
        ])
        .with_description(&[".section--body-text .content", ".section--body-text p"])
        .with_promoter(&[".section--header .container h1"])
        .with_lineup(&[".section--promoter-listings .card-ticket .ticket-artists li"])
}

impl IbizaSpotlight {
    pub fn new() -> Self {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(StructuredDataStrategy),
            Box::new(HtmlFallbackStrategy::dynamic(fallback_selectors())),
        ];

        Self {
            extractor: RecordExtractor::new(strategies).with_supplement(true),
            classifier: LinkClassifier::new(DETAIL_PREFIX),
            layout: ListingLayout {
                anchor_selector: "a[href*='/night/events/']".to_string(),
                next_selector: Some("li.nav-next a".to_string()),
                required_selector: Some(CALENDAR_BODY.to_string()),
                fetch_mode: FetchMode::Rendered,
                wait_for: Some(CALENDAR_BODY.to_string()),
            },
        }
    }
}

impl Default for IbizaSpotlight {
    fn default() -> Self {
        Self::new()
    }
}

impl Site for IbizaSpotlight {
    fn name(&self) -> &'static str {
        "ibiza-spotlight"
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
            mode: FetchMode::Rendered,
            wait_for: Some(DETAIL_CONTENT.to_string()),
        }
    }
}
