//! JSON-LD structured-data strategy

use crate::extract::document::Document;
use crate::extract::record::{EventDraft, ExtractionMethod};
use crate::extract::values::{detect_currency, parse_iso_datetime, parse_price};
use crate::extract::ExtractionStrategy;
use serde_json::Value;

/// Reads the first event object found in the page's JSON-LD blocks
///
/// Blocks may hold a single object, an array, or an `@graph` container.
/// Blocks that fail to parse or contain no event are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredDataStrategy;

impl ExtractionStrategy for StructuredDataStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::StructuredData
    }

    fn extract(&self, document: &Document) -> Option<EventDraft> {
        for (index, block) in document.json_ld_blocks().iter().enumerate() {
            let value: Value = match serde_json::from_str(block.trim()) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!("Skipping malformed JSON-LD block {}: {}", index, e);
                    continue;
                }
            };

            match find_event(&value) {
                Some(event) => {
                    let draft = map_event(event);
                    if draft.usable_title().is_some() {
                        return Some(draft);
                    }
                    tracing::debug!("JSON-LD event in block {} has no name", index);
                }
                None => tracing::trace!("JSON-LD block {} holds no event", index),
            }
        }
        None
    }
}

/// Checks whether a schema.org type names an event
pub fn is_event_type(type_name: &str) -> bool {
    let name = type_name.rsplit('/').next().unwrap_or(type_name);
    name.ends_with("Event") || name == "Festival"
}

fn has_event_type(object: &Value) -> bool {
    match object.get("@type") {
        Some(Value::String(name)) => is_event_type(name),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .any(is_event_type),
        _ => false,
    }
}

fn find_event(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_event),
        Value::Object(map) => {
            if has_event_type(value) {
                return Some(value);
            }
            map.get("@graph").and_then(find_event)
        }
        _ => None,
    }
}

fn map_event(event: &Value) -> EventDraft {
    let mut draft = EventDraft {
        title: string_field(event, "name"),
        description: string_field(event, "description"),
        venue: event.get("location").and_then(location_name),
        promoter: event
            .get("organizer")
            .and_then(first_item)
            .and_then(name_of),
        lineup: event.get("performer").map(performer_names).unwrap_or_default(),
        ..Default::default()
    };

    if let Some(start) = string_field(event, "startDate") {
        if let Some((date, time)) = parse_iso_datetime(&start) {
            draft.start_date = Some(date);
            draft.start_time = time;
        }
        draft.date_text = Some(start);
    }

    if let Some(end) = string_field(event, "endDate") {
        if let Some((date, time)) = parse_iso_datetime(&end) {
            draft.end_date = Some(date);
            draft.end_time = time;
        }
    }

    if let Some(offer) = event.get("offers").and_then(first_item) {
        let price_text = match offer.get("price").or_else(|| offer.get("lowPrice")) {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.trim().to_string()),
            _ => None,
        };

        if let Some(text) = price_text.filter(|t| !t.is_empty()) {
            draft.price_value = parse_price(&text);
            if draft.price_value.is_none() {
                tracing::warn!("Could not parse structured price {:?}", text);
            }
            draft.currency = detect_currency(&text).map(str::to_string);
            draft.price_text = Some(text);
        }

        if let Some(currency) = string_field(offer, "priceCurrency") {
            draft.currency = Some(currency);
        }
    }

    draft
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_item(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(_) => string_field(value, "name"),
        _ => None,
    }
}

fn location_name(location: &Value) -> Option<String> {
    let location = first_item(location)?;
    name_of(location).or_else(|| {
        location
            .get("address")
            .and_then(|address| name_of(address).or_else(|| string_field(address, "streetAddress")))
    })
}

fn performer_names(performer: &Value) -> Vec<String> {
    match performer {
        Value::Array(items) => items.iter().filter_map(name_of).collect(),
        other => name_of(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn page(blocks: &[&str]) -> Document {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{}</script>"#, b))
            .collect();
        Document::parse(&format!("<html><head>{}</head><body></body></html>", scripts))
    }

    #[test]
    fn test_full_event_mapping() {
        let doc = page(&[r#"{
            "@context": "https://schema.org",
            "@type": "MusicEvent",
            "name": "Circoloco",
            "startDate": "2025-07-14T23:00:00+02:00",
            "endDate": "2025-07-15T06:00:00+02:00",
            "location": {"@type": "Place", "name": "DC10"},
            "offers": [{"price": "65.00", "priceCurrency": "EUR"}, {"price": "90"}],
            "performer": [{"name": "Seth Troxler"}, {"name": "tINI"}],
            "organizer": {"name": "Circoloco Ibiza"},
            "description": "Monday institution"
        }"#]);

        let draft = StructuredDataStrategy.extract(&doc).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Circoloco"));
        assert_eq!(draft.venue.as_deref(), Some("DC10"));
        assert_eq!(draft.start_date, NaiveDate::from_ymd_opt(2025, 7, 14));
        assert_eq!(draft.start_time, NaiveTime::from_hms_opt(23, 0, 0));
        assert_eq!(draft.end_date, NaiveDate::from_ymd_opt(2025, 7, 15));
        assert_eq!(draft.price_value, Some(65.0));
        assert_eq!(draft.currency.as_deref(), Some("EUR"));
        assert_eq!(draft.lineup, vec!["Seth Troxler", "tINI"]);
        assert_eq!(draft.promoter.as_deref(), Some("Circoloco Ibiza"));
        assert_eq!(draft.description.as_deref(), Some("Monday institution"));
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let doc = page(&[
            "{ not json",
            r#"{"@type": "Event", "name": "Second Block"}"#,
        ]);
        let draft = StructuredDataStrategy.extract(&doc).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Second Block"));
    }

    #[test]
    fn test_non_event_block_is_skipped() {
        let doc = page(&[r#"{"@type": "Organization", "name": "Club"}"#]);
        assert!(StructuredDataStrategy.extract(&doc).is_none());
    }

    #[test]
    fn test_graph_container_and_type_array() {
        let doc = page(&[r#"{
            "@graph": [
                {"@type": "WebPage", "name": "Page"},
                {"@type": ["Thing", "Festival"], "name": "Closing Fiesta", "location": "Amnesia"}
            ]
        }"#]);
        let draft = StructuredDataStrategy.extract(&doc).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Closing Fiesta"));
        assert_eq!(draft.venue.as_deref(), Some("Amnesia"));
    }

    #[test]
    fn test_top_level_array_and_numeric_price() {
        let doc = page(&[r#"[
            {"@type": "BreadcrumbList"},
            {"@type": "Event", "name": "Pool Party", "offers": {"price": 40}}
        ]"#]);
        let draft = StructuredDataStrategy.extract(&doc).unwrap();
        assert_eq!(draft.price_text.as_deref(), Some("40"));
        assert_eq!(draft.price_value, Some(40.0));
    }

    #[test]
    fn test_event_without_name_is_nothing() {
        let doc = page(&[r#"{"@type": "Event", "location": {"name": "Pacha"}}"#]);
        assert!(StructuredDataStrategy.extract(&doc).is_none());
    }

    #[test]
    fn test_is_event_type() {
        assert!(is_event_type("Event"));
        assert!(is_event_type("MusicEvent"));
        assert!(is_event_type("https://schema.org/MusicEvent"));
        assert!(is_event_type("Festival"));
        assert!(!is_event_type("Place"));
    }
}
