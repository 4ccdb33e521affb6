//! Listing page parser
//!
//! This module reads what the pagination walker needs from a listing page:
//! - Candidate detail hrefs (from the site's anchor selector)
//! - The "next page" control, if any
//! - Whether the page has the structure the site requires

use crate::crawler::FetchMode;
use crate::extract::{parse_selector, Document};
use thiserror::Error;

/// Where things live on a site's listing pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLayout {
    /// Anchors that may point at detail pages
    pub anchor_selector: String,
    /// The control that leads to the next page/week/month
    pub next_selector: Option<String>,
    /// Element every real listing page contains
    pub required_selector: Option<String>,
    /// How listing pages must be fetched
    pub fetch_mode: FetchMode,
    /// Selector a renderer should wait for
    pub wait_for: Option<String>,
}

impl Default for ListingLayout {
    fn default() -> Self {
        Self {
            anchor_selector: "a[href]".to_string(),
            next_selector: None,
            required_selector: None,
            fetch_mode: FetchMode::Static,
            wait_for: None,
        }
    }
}

/// Extracted information from a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,
    /// Raw hrefs of candidate anchors, in document order
    pub hrefs: Vec<String>,
    /// Raw href of the next page control
    pub next_href: Option<String>,
}

/// The listing page lacked its required structure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Listing page is missing required element '{selector}'")]
pub struct MissingStructure {
    pub selector: String,
}

/// Parses a listing page according to a site layout
///
/// Anchors with a `download` attribute are skipped. Resolution and
/// classification of the hrefs is left to the link classifier.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `layout` - The site's listing layout
///
/// # Returns
///
/// * `Ok(ListingPage)` - Candidate hrefs and the next page control
/// * `Err(MissingStructure)` - The required element was not found
pub fn parse_listing(html: &str, layout: &ListingLayout) -> Result<ListingPage, MissingStructure> {
    let document = Document::parse(html);

    if let Some(required) = &layout.required_selector {
        if !document.exists(required) {
            return Err(MissingStructure {
                selector: required.clone(),
            });
        }
    }

    let hrefs = match parse_selector(&layout.anchor_selector) {
        Some(selector) => document
            .html()
            .select(&selector)
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect(),
        None => Vec::new(),
    };

    let next_href = layout
        .next_selector
        .as_deref()
        .and_then(|selector| document.attr_values(selector, "href").into_iter().next())
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

    Ok(ListingPage {
        title: document.title(),
        hrefs,
        next_href,
    })
}
