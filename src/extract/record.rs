use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency assumed when a page does not name one
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Which strategy produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Embedded JSON-LD blocks
    StructuredData,
    /// Attribute-annotated markup (itemscope/itemprop)
    Microdata,
    /// CSS selectors against a static page
    HtmlFallback,
    /// CSS selectors against a page that needed rendering
    DynamicHtml,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuredData => "structured-data",
            Self::Microdata => "microdata",
            Self::HtmlFallback => "html-fallback",
            Self::DynamicHtml => "dynamic-html",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated event extracted from one detail page
///
/// Records are only built with a non-empty title and are never mutated
/// after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub source_url: String,
    pub title: String,
    pub venue: Option<String>,
    pub date_text: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub price_text: Option<String>,
    pub price_value: Option<f64>,
    pub currency: String,
    pub lineup: Vec<String>,
    pub description: Option<String>,
    pub promoter: Option<String>,
    pub extraction_method: ExtractionMethod,
    pub scraped_at: DateTime<Utc>,
}

/// Partial record produced by a single strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub title: Option<String>,
    pub venue: Option<String>,
    pub date_text: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub price_text: Option<String>,
    pub price_value: Option<f64>,
    pub currency: Option<String>,
    pub lineup: Vec<String>,
    pub description: Option<String>,
    pub promoter: Option<String>,
}

impl EventDraft {
    /// Returns the title if it has visible content
    pub fn usable_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }

    /// Fills fields that are still empty from `other`
    ///
    /// Never overwrites a populated field, and never touches the title.
    pub fn supplement_from(&mut self, other: EventDraft) {
        fill(&mut self.venue, other.venue);
        fill(&mut self.date_text, other.date_text);
        fill(&mut self.start_date, other.start_date);
        fill(&mut self.end_date, other.end_date);
        fill(&mut self.start_time, other.start_time);
        fill(&mut self.end_time, other.end_time);
        fill(&mut self.price_text, other.price_text);
        fill(&mut self.price_value, other.price_value);
        fill(&mut self.currency, other.currency);
        fill(&mut self.description, other.description);
        fill(&mut self.promoter, other.promoter);
        if self.lineup.is_empty() {
            self.lineup = other.lineup;
        }
    }

    /// Turns the draft into a record, or `None` without a usable title
    pub fn into_record(
        self,
        source_url: &str,
        method: ExtractionMethod,
        scraped_at: DateTime<Utc>,
    ) -> Option<EventRecord> {
        let title = self.usable_title()?.to_string();

        Some(EventRecord {
            source_url: source_url.to_string(),
            title,
            venue: non_blank(self.venue),
            date_text: non_blank(self.date_text),
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            price_text: non_blank(self.price_text),
            price_value: self.price_value,
            currency: non_blank(self.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            lineup: self
                .lineup
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            description: non_blank(self.description),
            promoter: non_blank(self.promoter),
            extraction_method: method,
            scraped_at,
        })
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
