//! Record extraction for event detail pages
//!
//! A [`RecordExtractor`] runs an ordered chain of [`ExtractionStrategy`]
//! implementations over one document and stops at the first strategy that
//! yields a non-empty title.
//!
//! # Example
//!
//! ```
//! use event_harvester::extract::{ExtractionMethod, RecordExtractor};
//! use url::Url;
//!
//! let html = r#"<script type="application/ld+json">
//!     {"@type": "MusicEvent", "name": "Opening Party"}
//! </script>"#;
//! let url = Url::parse("https://example.com/event/opening-party").unwrap();
//!
//! let record = RecordExtractor::standard(Default::default()).extract(html, &url).unwrap();
//! assert_eq!(record.title, "Opening Party");
//! assert_eq!(record.extraction_method, ExtractionMethod::StructuredData);
//! ```

mod document;
mod fallback;
mod microdata;
mod record;
mod structured;
mod values;

use chrono::Utc;
use std::fmt::Debug;
use url::Url;

pub use document::{element_text, parse_selector, Document};
pub use fallback::{FallbackSelectors, HtmlFallbackStrategy};
pub use microdata::MicrodataStrategy;
pub use record::{EventDraft, EventRecord, ExtractionMethod, DEFAULT_CURRENCY};
pub use structured::{is_event_type, StructuredDataStrategy};
pub use values::{
    detect_currency, parse_compact_date, parse_date_text, parse_iso_datetime, parse_price,
    parse_times,
};

/// One technique for reading an event out of a document
pub trait ExtractionStrategy: Debug + Send + Sync {
    /// The method recorded on records this strategy produces
    fn method(&self) -> ExtractionMethod;

    /// Returns a partial record, or `None` when the strategy finds nothing
    ///
    /// Failures inside a strategy (bad blocks, invalid selectors, unparsable
    /// values) are logged and skipped, never raised.
    fn extract(&self, document: &Document) -> Option<EventDraft>;
}

/// Runs a prioritized chain of extraction strategies
#[derive(Debug)]
pub struct RecordExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    supplement: bool,
}

impl RecordExtractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            strategies,
            supplement: false,
        }
    }

    /// Structured data, then microdata, then the given selector fallback
    pub fn standard(fallback: FallbackSelectors) -> Self {
        Self::new(vec![
            Box::new(StructuredDataStrategy),
            Box::new(MicrodataStrategy),
            Box::new(HtmlFallbackStrategy::new(fallback)),
        ])
    }

    /// Lets strategies after the winner fill fields the winner left empty
    pub fn with_supplement(mut self, supplement: bool) -> Self {
        self.supplement = supplement;
        self
    }

    pub fn strategies(&self) -> impl Iterator<Item = ExtractionMethod> + '_ {
        self.strategies.iter().map(|s| s.method())
    }

    /// Extracts a record from raw HTML
    ///
    /// # Returns
    ///
    /// * `Some(EventRecord)` - A strategy found a titled event
    /// * `None` - No strategy found a title (no data)
    pub fn extract(&self, html: &str, source_url: &Url) -> Option<EventRecord> {
        let document = Document::parse(html);
        self.extract_document(&document, source_url)
    }

    /// Extracts a record from an already parsed document
    pub fn extract_document(&self, document: &Document, source_url: &Url) -> Option<EventRecord> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            let Some(mut draft) = strategy.extract(document) else {
                tracing::trace!("{} found nothing on {}", strategy.method(), source_url);
                continue;
            };

            if draft.usable_title().is_none() {
                tracing::trace!("{} found no title on {}", strategy.method(), source_url);
                continue;
            }

            if self.supplement {
                for later in &self.strategies[index + 1..] {
                    if let Some(extra) = later.extract(document) {
                        draft.supplement_from(extra);
                    }
                }
            }

            tracing::debug!("Extracted {} via {}", source_url, strategy.method());
            return draft.into_record(source_url.as_str(), strategy.method(), Utc::now());
        }

        tracing::debug!("No strategy produced a title for {}", source_url);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.com/event/sunset").unwrap()
    }

    fn extractor() -> RecordExtractor {
        RecordExtractor::standard(
            FallbackSelectors::default()
                .with_title(&["h1.entry-title"])
                .with_venue(&[".venue"]),
        )
    }

    const STRUCTURED_ONLY: &str = r#"<html><head>
        <script type="application/ld+json">{"@type": "Event", "name": "Structured"}</script>
        </head><body></body></html>"#;

    const MICRODATA_ONLY: &str = r#"<html><body>
        <div itemscope itemtype="https://schema.org/Event"><span itemprop="name">Annotated</span></div>
        </body></html>"#;

    const FALLBACK_ONLY: &str = r#"<html><body><h1 class="entry-title">Selected</h1></body></html>"#;

    #[test]
    fn test_structured_data_wins() {
        let record = extractor().extract(STRUCTURED_ONLY, &url()).unwrap();
        assert_eq!(record.extraction_method, ExtractionMethod::StructuredData);
        assert_eq!(record.title, "Structured");
    }

    #[test]
    fn test_microdata_when_no_structured_data() {
        let record = extractor().extract(MICRODATA_ONLY, &url()).unwrap();
        assert_eq!(record.extraction_method, ExtractionMethod::Microdata);
        assert_eq!(record.title, "Annotated");
    }

    #[test]
    fn test_fallback_when_nothing_else() {
        let record = extractor().extract(FALLBACK_ONLY, &url()).unwrap();
        assert_eq!(record.extraction_method, ExtractionMethod::HtmlFallback);
        assert_eq!(record.title, "Selected");
        assert_eq!(record.source_url, "https://example.com/event/sunset");
    }

    #[test]
    fn test_no_data() {
        let html = "<html><body><p>Nothing to see</p></body></html>";
        assert!(extractor().extract(html, &url()).is_none());
    }

    #[test]
    fn test_malformed_structured_data_falls_through() {
        let html = r#"<html><head>
            <script type="application/ld+json">{ broken</script>
            </head><body><h1 class="entry-title">Still Found</h1></body></html>"#;
        let record = extractor().extract(html, &url()).unwrap();
        assert_eq!(record.extraction_method, ExtractionMethod::HtmlFallback);
    }

    #[test]
    fn test_extraction_is_idempotent_except_timestamp() {
        let html = r#"<html><head>
            <script type="application/ld+json">
              {"@type": "MusicEvent", "name": "Twice", "startDate": "2025-08-02T23:00",
               "offers": {"price": "45", "priceCurrency": "EUR"}}
            </script></head><body><div class="venue">Amnesia</div></body></html>"#;

        let first = extractor().extract(html, &url()).unwrap();
        let mut second = extractor().extract(html, &url()).unwrap();
        second.scraped_at = first.scraped_at;

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_supplement_fills_missing_fields() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type": "Event", "name": "Chained"}</script>
            </head><body><h1 class="entry-title">Other</h1><div class="venue">Pacha</div></body></html>"#;

        let plain = extractor().extract(html, &url()).unwrap();
        assert_eq!(plain.venue, None);

        let chained = extractor().with_supplement(true).extract(html, &url()).unwrap();
        assert_eq!(chained.title, "Chained");
        assert_eq!(chained.venue.as_deref(), Some("Pacha"));
        assert_eq!(chained.extraction_method, ExtractionMethod::StructuredData);
    }
}
