//! CSS selector fallback strategy

use crate::extract::document::Document;
use crate::extract::record::{EventDraft, ExtractionMethod};
use crate::extract::values::{detect_currency, parse_date_text, parse_price, parse_times};
use crate::extract::ExtractionStrategy;

/// Prioritized selector lists for each field
///
/// For every field the selectors are tried in order and the first one that
/// matches non-empty text wins.
#[derive(Debug, Clone, Default)]
pub struct FallbackSelectors {
    pub title: Vec<String>,
    /// When set, the title is cut at the first occurrence of this separator
    pub title_separator: Option<char>,
    pub venue: Vec<String>,
    pub date: Vec<String>,
    pub time: Vec<String>,
    pub price: Vec<String>,
    pub description: Vec<String>,
    pub promoter: Vec<String>,
    pub lineup: Vec<String>,
}

fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

impl FallbackSelectors {
    pub fn with_title(mut self, selectors: &[&str]) -> Self {
        self.title = owned(selectors);
        self
    }

    pub fn with_title_separator(mut self, separator: char) -> Self {
        self.title_separator = Some(separator);
        self
    }

    pub fn with_venue(mut self, selectors: &[&str]) -> Self {
        self.venue = owned(selectors);
        self
    }

    pub fn with_date(mut self, selectors: &[&str]) -> Self {
        self.date = owned(selectors);
        self
    }

    pub fn with_time(mut self, selectors: &[&str]) -> Self {
        self.time = owned(selectors);
        self
    }

    pub fn with_price(mut self, selectors: &[&str]) -> Self {
        self.price = owned(selectors);
        self
    }

    pub fn with_description(mut self, selectors: &[&str]) -> Self {
        self.description = owned(selectors);
        self
    }

    pub fn with_promoter(mut self, selectors: &[&str]) -> Self {
        self.promoter = owned(selectors);
        self
    }

    pub fn with_lineup(mut self, selectors: &[&str]) -> Self {
        self.lineup = owned(selectors);
        self
    }
}

/// Applies [`FallbackSelectors`] to the raw document tree
#[derive(Debug, Clone)]
pub struct HtmlFallbackStrategy {
    selectors: FallbackSelectors,
    method: ExtractionMethod,
}

impl HtmlFallbackStrategy {
    /// Fallback for static pages
    pub fn new(selectors: FallbackSelectors) -> Self {
        Self {
            selectors,
            method: ExtractionMethod::HtmlFallback,
        }
    }

    /// Fallback for pages that are rendered before extraction
    pub fn dynamic(selectors: FallbackSelectors) -> Self {
        Self {
            selectors,
            method: ExtractionMethod::DynamicHtml,
        }
    }

    fn title(&self, document: &Document) -> Option<String> {
        let title = document.first_text(&self.selectors.title)?;
        match self.selectors.title_separator {
            Some(separator) => title
                .split(separator)
                .next()
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty()),
            None => Some(title),
        }
    }
}

impl ExtractionStrategy for HtmlFallbackStrategy {
    fn method(&self) -> ExtractionMethod {
        self.method
    }

    fn extract(&self, document: &Document) -> Option<EventDraft> {
        let title = self.title(document)?;
        let s = &self.selectors;

        let mut draft = EventDraft {
            title: Some(title),
            venue: document.first_text(&s.venue),
            description: document.first_text(&s.description),
            promoter: document.first_text(&s.promoter),
            lineup: document.all_texts(&s.lineup),
            ..Default::default()
        };

        let dates = document.all_texts(&s.date);
        if let Some(first) = dates.first() {
            draft.start_date = parse_date_text(first);
            if draft.start_date.is_none() {
                tracing::debug!("Unrecognized date label {:?}", first);
            }
            draft.date_text = Some(dates.join(", "));
        }

        let time_text = document
            .first_text(&s.time)
            .or_else(|| draft.date_text.clone());
        if let Some(text) = time_text {
            let mut times = parse_times(&text).into_iter();
            draft.start_time = times.next();
            draft.end_time = times.next();
        }

        if let Some(price_text) = document.first_text(&s.price) {
            draft.price_value = parse_price(&price_text);
            if draft.price_value.is_none() {
                tracing::warn!("Could not parse price from {:?}", price_text);
            }
            draft.currency = detect_currency(&price_text).map(str::to_string);
            draft.price_text = Some(price_text);
        }

        Some(draft)
    }
}
