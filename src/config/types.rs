use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default minimum delay between detail requests (seconds)
pub const MIN_DELAY_DEFAULT: f64 = 0.5;

/// Default maximum delay between detail requests (seconds)
pub const MAX_DELAY_DEFAULT: f64 = 1.5;

/// Default number of retries after the first failed attempt
pub const MAX_RETRIES_DEFAULT: u32 = 2;

/// Default worker count (1 = sequential)
pub const CONCURRENCY_DEFAULT: usize = 1;

/// Default per-call timeout for one fetch+extract attempt (seconds)
pub const REQUEST_TIMEOUT_DEFAULT: u64 = 45;

/// Default backoff base (seconds); retry `n` (1-based) waits `base * 2^n`
pub const BACKOFF_BASE_DEFAULT: f64 = 1.0;

/// Default bound on listing pages visited during pagination
pub const MAX_PAGES_DEFAULT: usize = 10;

/// Default number of requests served by one user agent before rotating
pub const ROTATE_AFTER_DEFAULT: u32 = 10;

/// Default output directory
pub const OUTPUT_DIR_DEFAULT: &str = "output";

/// Browser-like user agents used for rotation
pub const MODERN_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
];

/// File-level configuration for Event Harvester
///
/// Every section and key is optional; missing values fall back to the
/// process-wide defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Crawl pacing, retry and pagination settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlSettings {
    /// Minimum delay between detail requests (seconds)
    pub min_delay: f64,

    /// Maximum delay between detail requests (seconds)
    pub max_delay: f64,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Number of concurrent workers (1 = sequential)
    pub concurrency: usize,

    /// Timeout for a single fetch+extract attempt (seconds)
    pub request_timeout: u64,

    /// Exponential backoff base (seconds)
    pub backoff_base: f64,

    /// Maximum listing pages visited during pagination
    pub max_pages: usize,

    /// Scrape detail pages while paginating instead of after
    pub eager: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            min_delay: MIN_DELAY_DEFAULT,
            max_delay: MAX_DELAY_DEFAULT,
            max_retries: MAX_RETRIES_DEFAULT,
            concurrency: CONCURRENCY_DEFAULT,
            request_timeout: REQUEST_TIMEOUT_DEFAULT,
            backoff_base: BACKOFF_BASE_DEFAULT,
            max_pages: MAX_PAGES_DEFAULT,
            eager: false,
        }
    }
}

/// User agent rotation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentSettings {
    /// Pool of user agent strings to rotate through
    pub agents: Vec<String>,

    /// Requests served by one agent before a new one is picked
    pub rotate_after: u32,
}

impl Default for UserAgentSettings {
    fn default() -> Self {
        Self {
            agents: MODERN_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            rotate_after: ROTATE_AFTER_DEFAULT,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory that receives result files
    pub dir: PathBuf,

    /// Output formats to write ("json", "markdown")
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(OUTPUT_DIR_DEFAULT),
            formats: vec![OutputFormat::Json, OutputFormat::Markdown],
        }
    }
}

/// Supported result file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Markdown,
}

/// What a run does with its entry URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Extract a single detail page
    Scrape,
    /// Walk a listing, then extract every discovered detail page
    Crawl,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Crawl => "crawl",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective configuration of one run: CLI arguments layered over the file config
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub action: Action,
    pub entry_url: Url,
    pub headless: bool,
    pub min_delay: f64,
    pub max_delay: f64,
    pub max_retries: u32,
    pub concurrency: usize,
    pub output_dir: PathBuf,
    pub request_timeout: u64,
    pub backoff_base: f64,
    pub max_pages: usize,
    pub eager: bool,
    pub formats: Vec<OutputFormat>,
    pub user_agent: UserAgentSettings,
    /// SHA-256 of the config file, when one was loaded
    pub config_hash: Option<String>,
}

impl RunConfig {
    /// Builds a run configuration from the file config with no CLI overrides
    pub fn from_config(action: Action, entry_url: Url, config: &HarvestConfig) -> Self {
        Self {
            action,
            entry_url,
            headless: true,
            min_delay: config.crawl.min_delay,
            max_delay: config.crawl.max_delay,
            max_retries: config.crawl.max_retries,
            concurrency: config.crawl.concurrency,
            output_dir: config.output.dir.clone(),
            request_timeout: config.crawl.request_timeout,
            backoff_base: config.crawl.backoff_base,
            max_pages: config.crawl.max_pages,
            eager: config.crawl.eager,
            formats: config.output.formats.clone(),
            user_agent: config.user_agent.clone(),
            config_hash: None,
        }
    }

    pub fn min_delay(&self) -> Duration {
        seconds(self.min_delay)
    }

    pub fn max_delay(&self) -> Duration {
        seconds(self.max_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn backoff_base(&self) -> Duration {
        seconds(self.backoff_base)
    }
}

/// Converts seconds to a `Duration`, clamping negative or NaN values to zero
/// and values too large to represent to `Duration::MAX`
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}
