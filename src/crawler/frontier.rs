//! Shared URL sets used during discovery

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use url::Url;

/// Deduplicated detail URLs in discovery order
///
/// Membership test and insertion happen under one lock, so a URL found on
/// two pages (or by two tasks) is queued once.
#[derive(Debug, Default)]
pub struct CrawlFrontier {
    inner: Mutex<FrontierInner>,
}

#[derive(Debug, Default)]
struct FrontierInner {
    seen: HashSet<Url>,
    order: Vec<Url>,
}

impl CrawlFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a URL, returning true if it was not already present
    pub fn insert(&self, url: Url) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.seen.insert(url.clone()) {
            inner.order.push(url);
            true
        } else {
            false
        }
    }

    /// Inserts many URLs, returning those that were new
    pub fn extend<I: IntoIterator<Item = Url>>(&self, urls: I) -> Vec<Url> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut added = Vec::new();
        for url in urls {
            if inner.seen.insert(url.clone()) {
                inner.order.push(url.clone());
                added.push(url);
            }
        }
        added
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seen
            .contains(url)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all URLs in discovery order
    pub fn urls(&self) -> Vec<Url> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    pub fn into_urls(self) -> Vec<Url> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .order
    }
}

/// Listing pages already fetched during a walk
#[derive(Debug, Default, Clone)]
pub struct VisitedPages {
    pages: HashSet<Url>,
}

impl VisitedPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a page visited, returning true if it was not visited before
    pub fn mark(&mut self, url: Url) -> bool {
        self.pages.insert(url)
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.pages.contains(url)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
