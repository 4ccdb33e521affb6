//! Event Harvester: crawl-and-extract engine for event listing sites
//!
//! This crate discovers event detail pages from paginated listing/calendar pages,
//! extracts typed event records from them with a prioritized strategy chain, and
//! drives the whole run under retry, delay, and concurrency constraints.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod sites;
pub mod state;
pub mod url;

use thiserror::Error;

/// Fatal errors that stop a run before or after the crawl itself
///
/// Per-URL failures never surface here; they are recorded in the run report.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No site configured for hostname: {hostname}")]
    UnknownSite { hostname: String },

    #[error("Invalid URL: could not determine hostname of '{0}'")]
    MissingHostname(String),

    #[error("Invalid argument combination: {0}")]
    InvalidCombination(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Event Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{HarvestConfig, RunConfig};
pub use extract::{EventRecord, ExtractionMethod, RecordExtractor};
pub use sites::{resolve_site, Site};
pub use state::{RunProgress, WalkState};
pub use url::{normalize_url, LinkClassifier};
