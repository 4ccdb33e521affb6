use crate::config::types::{
    Action, CrawlSettings, HarvestConfig, OutputSettings, RunConfig, UserAgentSettings,
};
use crate::ConfigError;

/// Upper bound on concurrent workers
const MAX_CONCURRENCY: usize = 32;

/// Upper bound on retries per URL
const MAX_RETRIES_LIMIT: u32 = 10;

/// Upper bound on either request delay (seconds)
const MAX_DELAY_LIMIT: f64 = 3600.0;

/// Upper bound on the retry backoff base (seconds)
const MAX_BACKOFF_BASE_LIMIT: f64 = 300.0;

/// Validates the entire file configuration
pub fn validate(config: &HarvestConfig) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawl)?;
    validate_user_agent_settings(&config.user_agent)?;
    validate_output_settings(&config.output)?;
    Ok(())
}

/// Validates the effective run configuration after CLI overrides
pub fn validate_run(run: &RunConfig) -> Result<(), ConfigError> {
    validate_delays(run.min_delay, run.max_delay)?;
    validate_concurrency(run.concurrency)?;
    validate_retries(run.max_retries)?;

    if run.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            run.max_pages
        )));
    }

    if run.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be at least 1 second".to_string(),
        ));
    }

    validate_backoff_base(run.backoff_base)?;

    if run.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    validate_user_agent_settings(&run.user_agent)?;

    let scheme = run.entry_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::InvalidCombination(format!(
            "entry URL must use http or https, got '{}'",
            scheme
        )));
    }

    if run.entry_url.host_str().is_none() {
        return Err(ConfigError::MissingHostname(run.entry_url.to_string()));
    }

    if run.eager && run.action == Action::Scrape {
        return Err(ConfigError::InvalidCombination(
            "--eager only applies to the crawl action".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl settings
fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    validate_delays(settings.min_delay, settings.max_delay)?;
    validate_concurrency(settings.concurrency)?;
    validate_retries(settings.max_retries)?;

    if settings.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be at least 1 second".to_string(),
        ));
    }

    validate_backoff_base(settings.backoff_base)?;

    if settings.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            settings.max_pages
        )));
    }

    Ok(())
}

fn validate_seconds(name: &str, value: f64, limit: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 || value > limit {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and {} seconds, got {}",
            name, limit, value
        )));
    }
    Ok(())
}

fn validate_backoff_base(backoff_base: f64) -> Result<(), ConfigError> {
    validate_seconds("backoff_base", backoff_base, MAX_BACKOFF_BASE_LIMIT)
}

fn validate_delays(min_delay: f64, max_delay: f64) -> Result<(), ConfigError> {
    validate_seconds("min_delay", min_delay, MAX_DELAY_LIMIT)?;
    validate_seconds("max_delay", max_delay, MAX_DELAY_LIMIT)?;

    if min_delay > max_delay {
        return Err(ConfigError::Validation(format!(
            "min_delay ({}) cannot exceed max_delay ({})",
            min_delay, max_delay
        )));
    }

    Ok(())
}

fn validate_concurrency(concurrency: usize) -> Result<(), ConfigError> {
    if concurrency < 1 || concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, concurrency
        )));
    }
    Ok(())
}

fn validate_retries(max_retries: u32) -> Result<(), ConfigError> {
    if max_retries > MAX_RETRIES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= {}, got {}",
            MAX_RETRIES_LIMIT, max_retries
        )));
    }
    Ok(())
}

/// Validates user agent rotation settings
fn validate_user_agent_settings(settings: &UserAgentSettings) -> Result<(), ConfigError> {
    if settings.agents.is_empty() {
        return Err(ConfigError::Validation(
            "user agent pool cannot be empty".to_string(),
        ));
    }

    if settings.agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user agent pool cannot contain blank entries".to_string(),
        ));
    }

    if settings.rotate_after < 1 {
        return Err(ConfigError::Validation(format!(
            "rotate-after must be >= 1, got {}",
            settings.rotate_after
        )));
    }

    Ok(())
}

/// Validates output settings
fn validate_output_settings(settings: &OutputSettings) -> Result<(), ConfigError> {
    if settings.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn run_config(action: Action) -> RunConfig {
        RunConfig::from_config(
            action,
            Url::parse("https://www.ibiza-spotlight.com/night/events/2025/05").unwrap(),
            &HarvestConfig::default(),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&HarvestConfig::default()).is_ok());
        assert!(validate_run(&run_config(Action::Crawl)).is_ok());
    }

    #[test]
    fn test_validate_delays() {
        assert!(validate_delays(0.0, 0.0).is_ok());
        assert!(validate_delays(0.5, 1.5).is_ok());

        assert!(validate_delays(2.0, 1.0).is_err());
        assert!(validate_delays(-1.0, 1.0).is_err());
        assert!(validate_delays(0.5, f64::NAN).is_err());
        assert!(validate_delays(0.5, f64::INFINITY).is_err());
    }

    #[test]
    fn test_huge_delays_rejected() {
        assert!(validate_delays(0.0, MAX_DELAY_LIMIT).is_ok());
        assert!(validate_delays(0.0, MAX_DELAY_LIMIT + 1.0).is_err());

        let mut run = run_config(Action::Crawl);
        run.max_delay = 1e30;
        assert!(matches!(
            validate_run(&run),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_huge_backoff_base_rejected() {
        let mut run = run_config(Action::Crawl);
        run.backoff_base = 1e30;
        assert!(matches!(
            validate_run(&run),
            Err(ConfigError::Validation(_))
        ));

        let mut config = HarvestConfig::default();
        config.crawl.backoff_base = -1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        assert!(validate_concurrency(1).is_ok());
        assert!(validate_concurrency(32).is_ok());

        assert!(validate_concurrency(0).is_err());
        assert!(validate_concurrency(33).is_err());
    }

    #[test]
    fn test_empty_agent_pool_rejected() {
        let mut config = HarvestConfig::default();
        config.user_agent.agents.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_eager_scrape_is_invalid_combination() {
        let mut run = run_config(Action::Scrape);
        run.eager = true;
        assert!(matches!(
            validate_run(&run),
            Err(ConfigError::InvalidCombination(_))
        ));
    }

    #[test]
    fn test_non_http_entry_rejected() {
        let mut run = run_config(Action::Crawl);
        run.entry_url = Url::parse("ftp://example.com/events").unwrap();
        assert!(matches!(
            validate_run(&run),
            Err(ConfigError::InvalidCombination(_))
        ));
    }
}
