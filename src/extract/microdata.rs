//! Attribute-annotated markup (microdata) strategy

use crate::extract::document::{element_text, parse_selector, Document};
use crate::extract::record::{EventDraft, ExtractionMethod};
use crate::extract::structured::is_event_type;
use crate::extract::values::{detect_currency, parse_iso_datetime, parse_price};
use crate::extract::ExtractionStrategy;
use scraper::ElementRef;

/// Reads properties from the first `itemscope` typed as an event
///
/// Only properties owned by the event scope are read; properties of nested
/// scopes (location, offers, performer, organizer) are read through the
/// nested scope itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrodataStrategy;

impl ExtractionStrategy for MicrodataStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Microdata
    }

    fn extract(&self, document: &Document) -> Option<EventDraft> {
        let scope = find_event_scope(document)?;
        let draft = read_event(scope);
        draft.usable_title()?;
        Some(draft)
    }
}

fn find_event_scope(document: &Document) -> Option<ElementRef<'_>> {
    let selector = parse_selector("[itemscope][itemtype]")?;
    document.html().select(&selector).find(|element| {
        element
            .value()
            .attr("itemtype")
            .map(|types| types.split_whitespace().any(is_event_type))
            .unwrap_or(false)
    })
}

/// Checks that the nearest enclosing `itemscope` of `element` is `scope`
fn owned_by(element: ElementRef<'_>, scope: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().attr("itemscope").is_some())
        .map_or(false, |owner| owner.id() == scope.id())
}

/// Properties owned directly by `scope`, as (name, element) pairs
fn properties(scope: ElementRef<'_>) -> Vec<(String, ElementRef<'_>)> {
    let Some(selector) = parse_selector("[itemprop]") else {
        return Vec::new();
    };

    let mut props = Vec::new();
    for element in scope.select(&selector) {
        if !owned_by(element, scope) {
            continue;
        }
        if let Some(names) = element.value().attr("itemprop") {
            for name in names.split_whitespace() {
                props.push((name.to_string(), element));
            }
        }
    }
    props
}

fn property_value(element: ElementRef<'_>) -> Option<String> {
    let attrs = element.value();
    let value = attrs
        .attr("content")
        .or_else(|| attrs.attr("datetime"))
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| element_text(element));

    Some(value).filter(|v| !v.is_empty())
}

/// Value of a nested item's `name`, or its own text when it is not a scope
fn nested_name(element: ElementRef<'_>) -> Option<String> {
    if element.value().attr("itemscope").is_none() {
        return property_value(element);
    }
    properties(element)
        .into_iter()
        .find(|(name, _)| name == "name")
        .and_then(|(_, prop)| property_value(prop))
}

fn read_event(scope: ElementRef<'_>) -> EventDraft {
    let mut draft = EventDraft::default();

    for (name, element) in properties(scope) {
        match name.as_str() {
            "name" if draft.title.is_none() => draft.title = property_value(element),
            "description" if draft.description.is_none() => {
                draft.description = property_value(element)
            }
            "startDate" if draft.date_text.is_none() => {
                if let Some(text) = property_value(element) {
                    if let Some((date, time)) = parse_iso_datetime(&text) {
                        draft.start_date = Some(date);
                        draft.start_time = time;
                    }
                    draft.date_text = Some(text);
                }
            }
            "endDate" if draft.end_date.is_none() => {
                if let Some((date, time)) =
                    property_value(element).and_then(|text| parse_iso_datetime(&text))
                {
                    draft.end_date = Some(date);
                    draft.end_time = time;
                }
            }
            "location" if draft.venue.is_none() => draft.venue = nested_name(element),
            "organizer" if draft.promoter.is_none() => draft.promoter = nested_name(element),
            "performer" => {
                if let Some(performer) = nested_name(element) {
                    draft.lineup.push(performer);
                }
            }
            "offers" if draft.price_text.is_none() => read_offer(element, &mut draft),
            _ => {}
        }
    }

    draft
}

fn read_offer(offer: ElementRef<'_>, draft: &mut EventDraft) {
    let props = if offer.value().attr("itemscope").is_some() {
        properties(offer)
    } else {
        vec![("price".to_string(), offer)]
    };

    for (name, element) in props {
        match name.as_str() {
            "price" | "lowPrice" if draft.price_text.is_none() => {
                if let Some(text) = property_value(element) {
                    draft.price_value = parse_price(&text);
                    if draft.price_value.is_none() {
                        tracing::warn!("Could not parse microdata price {:?}", text);
                    }
                    if draft.currency.is_none() {
                        draft.currency = detect_currency(&text).map(str::to_string);
                    }
                    draft.price_text = Some(text);
                }
            }
            "priceCurrency" => draft.currency = property_value(element),
            _ => {}
        }
    }
}
