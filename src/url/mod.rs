//! URL handling module for Event Harvester
//!
//! This module provides URL normalization, host helpers, and the link
//! classifier that separates event detail pages from listing navigation.

mod domain;
mod matcher;
mod normalize;

use std::collections::HashSet;
use url::Url;

pub use domain::{extract_host, host_slug};
pub use matcher::{has_alphabetic_segment, is_date_navigation};
pub use normalize::{normalize_parsed, normalize_url};

/// Why a candidate link was not accepted as a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Empty, non-navigational (javascript:, mailto:, ...) or unparsable href
    Unresolvable,
    /// Path does not start with the site's detail prefix
    OutsidePrefix,
    /// Link points back at the current page or the listing entry
    SelfLink,
    /// Link carries a query string or fragment
    QueryOrFragment,
    /// Nothing follows the detail prefix
    EmptyRemainder,
    /// Path remainder is a year, year/month or year/month/day
    DateNavigation,
    /// No path segment contains a letter
    NoAlphabeticSegment,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolvable => "unresolvable",
            Self::OutsidePrefix => "outside-prefix",
            Self::SelfLink => "self-link",
            Self::QueryOrFragment => "query-or-fragment",
            Self::EmptyRemainder => "empty-remainder",
            Self::DateNavigation => "date-navigation",
            Self::NoAlphabeticSegment => "no-alphabetic-segment",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a single href
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkVerdict {
    /// A crawlable detail page, already normalized
    Detail(Url),
    /// Navigation or noise
    Rejected(RejectReason),
}

/// Separates detail-page links from listing navigation
///
/// Rules are applied in order to every candidate href; the first rule that
/// rejects wins.
///
/// 1. Resolve relative to the current page
/// 2. Require the detail path prefix
/// 3. Reject links to the current page or the listing entry
/// 4. Reject links with a query string or fragment
/// 5. Require at least one path segment after the prefix
/// 6. Reject date-shaped remainders (calendar navigation)
/// 7. Require a segment containing a letter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClassifier {
    detail_prefix: String,
}

impl LinkClassifier {
    /// Creates a classifier for detail pages living under `detail_prefix`
    ///
    /// The prefix is stored with a leading and trailing slash, so `events`,
    /// `/events` and `/events/` are equivalent.
    pub fn new(detail_prefix: &str) -> Self {
        let trimmed = detail_prefix.trim_matches('/');
        let detail_prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };
        Self { detail_prefix }
    }

    pub fn detail_prefix(&self) -> &str {
        &self.detail_prefix
    }

    /// Classifies a batch of hrefs found on a listing page
    ///
    /// # Arguments
    ///
    /// * `hrefs` - Raw href attribute values in document order
    /// * `base_listing_url` - The listing entry point of the crawl
    /// * `current_page_url` - The page the hrefs were found on
    ///
    /// # Returns
    ///
    /// Normalized detail URLs, deduplicated, in order of first appearance
    pub fn classify<I, S>(&self, hrefs: I, base_listing_url: &Url, current_page_url: &Url) -> Vec<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut details = Vec::new();
        let mut seen = HashSet::new();
        let mut rejected = 0usize;

        for href in hrefs {
            match self.classify_one(href.as_ref(), base_listing_url, current_page_url) {
                LinkVerdict::Detail(url) => {
                    if seen.insert(url.clone()) {
                        details.push(url);
                    }
                }
                LinkVerdict::Rejected(reason) => {
                    rejected += 1;
                    tracing::trace!("Rejected link {:?}: {}", href.as_ref(), reason);
                }
            }
        }

        tracing::debug!(
            "Classified links on {}: {} detail, {} rejected",
            current_page_url,
            details.len(),
            rejected
        );

        details
    }

    /// Classifies a single href
    pub fn classify_one(&self, href: &str, base_listing_url: &Url, current_page_url: &Url) -> LinkVerdict {
        let resolved = match resolve_href(href, current_page_url) {
            Some(url) => url,
            None => return LinkVerdict::Rejected(RejectReason::Unresolvable),
        };

        let path = resolved.path();
        let remainder = match path.strip_prefix(self.detail_prefix.as_str()) {
            Some(rest) => rest,
            None => return LinkVerdict::Rejected(RejectReason::OutsidePrefix),
        };

        if is_self_link(&resolved, base_listing_url) || is_self_link(&resolved, current_page_url) {
            return LinkVerdict::Rejected(RejectReason::SelfLink);
        }

        let has_query = resolved.query().map_or(false, |q| !q.is_empty());
        let has_fragment = resolved.fragment().map_or(false, |f| !f.is_empty());
        if has_query || has_fragment {
            return LinkVerdict::Rejected(RejectReason::QueryOrFragment);
        }

        let segments: Vec<&str> = remainder.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return LinkVerdict::Rejected(RejectReason::EmptyRemainder);
        }

        if is_date_navigation(&segments) {
            return LinkVerdict::Rejected(RejectReason::DateNavigation);
        }

        if !has_alphabetic_segment(&segments) {
            return LinkVerdict::Rejected(RejectReason::NoAlphabeticSegment);
        }

        match normalize_parsed(resolved) {
            Ok(url) => LinkVerdict::Detail(url),
            Err(_) => LinkVerdict::Rejected(RejectReason::Unresolvable),
        }
    }
}

/// Resolves an href against the page it was found on
///
/// Returns `None` for empty hrefs, in-page anchors, and non-navigational
/// schemes.
pub fn resolve_href(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = page_url.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

fn is_self_link(candidate: &Url, page: &Url) -> bool {
    if candidate == page || candidate.path() == page.path() {
        return true;
    }
    matches!(
        (normalize_parsed(candidate.clone()), normalize_parsed(page.clone())),
        (Ok(a), Ok(b)) if a == b
    )
}
