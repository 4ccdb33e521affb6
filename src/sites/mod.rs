//! Site capability sets and the hostname resolver
//!
//! Each supported site implements [`Site`]: how to extract a record from one
//! of its detail pages, how to classify links on its listings, and where its
//! listing structure lives. [`resolve_site`] picks the implementation by
//! hostname.

mod ibiza_spotlight;
mod tickets_ibiza;

pub use ibiza_spotlight::IbizaSpotlight;
pub use tickets_ibiza::TicketsIbiza;

use crate::crawler::{FetchMode, ListingLayout};
use crate::extract::EventRecord;
use crate::url::{extract_host, LinkClassifier};
use crate::{ConfigError, ConfigResult};
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

/// How a site's detail pages must be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFetch {
    pub mode: FetchMode,
    pub wait_for: Option<String>,
}

/// Extraction and classification behavior of one site
pub trait Site: Debug + Send + Sync {
    /// Short stable name used in logs and output
    fn name(&self) -> &'static str;

    /// Extracts a record from a detail page, `None` when it holds no event
    fn extract(&self, html: &str, source_url: &Url) -> Option<EventRecord>;

    /// The site's detail link classifier
    fn classifier(&self) -> &LinkClassifier;

    /// Listing page structure used by the pagination walker
    fn crawl_entry(&self) -> &ListingLayout;

    /// How detail pages are fetched
    fn detail_fetch(&self) -> DetailFetch;

    /// Classifies hrefs found on one of the site's listing pages
    fn classify(&self, hrefs: &[String], base_listing_url: &Url, current_page_url: &Url) -> Vec<Url> {
        self.classifier()
            .classify(hrefs, base_listing_url, current_page_url)
    }
}

type SiteFactory = fn() -> Arc<dyn Site>;

fn tickets_ibiza() -> Arc<dyn Site> {
    Arc::new(TicketsIbiza::new())
}

fn ibiza_spotlight() -> Arc<dyn Site> {
    Arc::new(IbizaSpotlight::new())
}

/// Known sites, matched by hostname substring in order
const KNOWN_SITES: &[(&str, SiteFactory)] = &[
    ("ticketsibiza", tickets_ibiza),
    ("ibiza-spotlight", ibiza_spotlight),
];

/// Hostname fragments of every supported site
pub fn known_hosts() -> impl Iterator<Item = &'static str> {
    KNOWN_SITES.iter().map(|(fragment, _)| *fragment)
}

/// Resolves the site implementation for a URL
///
/// # Arguments
///
/// * `url` - Any URL on the site (entry listing or detail page)
///
/// # Returns
///
/// * `Ok(Arc<dyn Site>)` - The site whose hostname fragment matches
/// * `Err(ConfigError::UnknownSite)` - No site matches the hostname
/// * `Err(ConfigError::MissingHostname)` - The URL has no hostname
///
/// # Example
///
/// ```
/// use event_harvester::sites::resolve_site;
/// use url::Url;
///
/// let url = Url::parse("https://www.ibiza-spotlight.com/night/events/2025/06").unwrap();
/// assert_eq!(resolve_site(&url).unwrap().name(), "ibiza-spotlight");
/// ```
pub fn resolve_site(url: &Url) -> ConfigResult<Arc<dyn Site>> {
    let host = extract_host(url).ok_or_else(|| ConfigError::MissingHostname(url.to_string()))?;

    KNOWN_SITES
        .iter()
        .find(|(fragment, _)| host.contains(fragment))
        .map(|(_, factory)| factory())
        .ok_or(ConfigError::UnknownSite { hostname: host })
}
