//! Query helpers over a parsed HTML document
//!
//! `scraper::Html` is not `Send`, so a `Document` is built, queried and
//! dropped inside synchronous code and never held across an await point.

use scraper::{ElementRef, Html, Selector};

/// A parsed page with the query primitives the extractors need
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Raw text of every embedded JSON-LD block, in document order
    pub fn json_ld_blocks(&self) -> Vec<String> {
        match parse_selector(r#"script[type="application/ld+json"]"#) {
            Some(selector) => self
                .html
                .select(&selector)
                .map(|element| element.text().collect::<String>())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Trimmed text of the first non-empty match across prioritized selectors
    pub fn first_text(&self, selectors: &[String]) -> Option<String> {
        selectors.iter().find_map(|selector| {
            let selector = parse_selector(selector)?;
            self.html
                .select(&selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    /// All non-empty texts from the first selector that matches anything
    pub fn all_texts(&self, selectors: &[String]) -> Vec<String> {
        for selector in selectors {
            let Some(parsed) = parse_selector(selector) else {
                continue;
            };
            let texts: Vec<String> = self
                .html
                .select(&parsed)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();
            if !texts.is_empty() {
                return texts;
            }
        }
        Vec::new()
    }

    /// Attribute values of every element matching `selector`
    pub fn attr_values(&self, selector: &str, attr: &str) -> Vec<String> {
        match parse_selector(selector) {
            Some(selector) => self
                .html
                .select(&selector)
                .filter_map(|element| element.value().attr(attr))
                .map(|value| value.to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns true if any element matches `selector`
    pub fn exists(&self, selector: &str) -> bool {
        parse_selector(selector)
            .map(|selector| self.html.select(&selector).next().is_some())
            .unwrap_or(false)
    }

    /// Text of the `<title>` element
    pub fn title(&self) -> Option<String> {
        self.first_text(&["title".to_string()])
    }
}

/// Parses a CSS selector, logging and discarding invalid ones
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Invalid selector {:?}: {}", selector, e);
            None
        }
    }
}

/// Collapsed, trimmed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
