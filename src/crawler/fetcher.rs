//! Page fetching
//!
//! This module defines the fetch capability the crawl core consumes and its
//! HTTP implementation:
//! - Fetch modes (static vs. rendered)
//! - Fetch error classification and retry eligibility
//! - A shared reqwest client with user agent rotation

use crate::config::UserAgentSettings;
use crate::state::ErrorKind;
use rand::Rng;
use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How a page should be retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// Plain HTTP GET
    Static,
    /// Page needs a browser render before its content is complete
    Rendered,
}

impl FetchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Rendered => "rendered",
        }
    }
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to retrieve a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Network { url, .. } | Self::HttpStatus { url, .. } => url,
        }
    }

    /// Maps the failure onto the run report's error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::FetchTimeout,
            Self::Network { .. } => ErrorKind::FetchError,
            Self::HttpStatus { .. } => ErrorKind::HttpStatusError,
        }
    }

    /// Returns true if a retry could plausibly succeed
    ///
    /// Timeouts, network errors, HTTP 429 and 5xx are transient; other
    /// status errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Network {
                url: url.to_string(),
                message: "Connection refused".to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Capability to retrieve the HTML of a page
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns its HTML
    ///
    /// # Arguments
    ///
    /// * `url` - Page to fetch
    /// * `mode` - Static fetch or rendered page
    /// * `wait_for` - Selector a renderer should wait for before reading the page
    async fn fetch(&self, url: &Url, mode: FetchMode, wait_for: Option<&str>) -> Result<String, FetchError>;
}

/// Picks user agents from a pool, switching every `rotate_after` requests
#[derive(Debug)]
pub struct UserAgentRotation {
    agents: Vec<String>,
    rotate_after: u32,
    state: Mutex<RotationState>,
}

#[derive(Debug, Default)]
struct RotationState {
    current: usize,
    served: u32,
}

impl UserAgentRotation {
    pub fn new(settings: &UserAgentSettings) -> Self {
        Self {
            agents: settings.agents.clone(),
            rotate_after: settings.rotate_after.max(1),
            state: Mutex::new(RotationState::default()),
        }
    }

    /// Returns the agent for the next request
    pub fn next_agent(&self) -> Option<&str> {
        if self.agents.is_empty() {
            return None;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.served >= self.rotate_after {
            state.current = rand::rng().random_range(0..self.agents.len());
            state.served = 0;
            tracing::debug!("Rotated user agent to pool entry {}", state.current);
        }
        state.served += 1;

        self.agents.get(state.current).map(String::as_str)
    }
}

/// Builds the shared HTTP client
///
/// The client is safe to share between workers; the user agent is set per
/// request by [`HttpFetcher`].
///
/// # Arguments
///
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP implementation of [`PageFetcher`]
///
/// Rendering is not performed; rendered-mode requests are served with a
/// static GET.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    agents: UserAgentRotation,
}

impl HttpFetcher {
    pub fn new(client: Client, user_agents: &UserAgentSettings) -> Self {
        Self {
            client,
            agents: UserAgentRotation::new(user_agents),
        }
    }

    /// Builds a fetcher with its own client
    pub fn from_settings(user_agents: &UserAgentSettings, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(timeout)?, user_agents))
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, mode: FetchMode, wait_for: Option<&str>) -> Result<String, FetchError> {
        if mode == FetchMode::Rendered {
            tracing::debug!(
                "Rendered fetch requested for {} (wait for {:?}); using static GET",
                url,
                wait_for
            );
        }

        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"))
            .header(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));
        if let Some(agent) = self.agents.next_agent() {
            request = request.header(USER_AGENT, agent);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("HTTP {} from {}", status.as_u16(), url);
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(String::new());
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}
