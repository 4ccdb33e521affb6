//! Configuration module for Event Harvester
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and layering CLI arguments over it into a [`RunConfig`].
//!
//! # Example
//!
//! ```no_run
//! use event_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawl will use {} worker(s)", config.crawl.concurrency);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Action, CrawlSettings, HarvestConfig, OutputFormat, OutputSettings, RunConfig,
    UserAgentSettings, BACKOFF_BASE_DEFAULT, MAX_DELAY_DEFAULT, MAX_PAGES_DEFAULT,
    MAX_RETRIES_DEFAULT, MIN_DELAY_DEFAULT, MODERN_USER_AGENTS, OUTPUT_DIR_DEFAULT,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_run};
