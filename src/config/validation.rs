use crate::config::types::{Config, CrawlerConfig, FetcherConfig, OutputConfig};
use crate::ConfigError;

/// Upper bound on the page budget accepted by the crawl entry point
pub const MAX_PAGES_LIMIT: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be between 1 and timeout-secs ({}), got {}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.retries > 5 {
        return Err(ConfigError::Validation(format!(
            "retries must be <= 5, got {}",
            config.retries
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.default_max_pages < 1 || config.default_max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "default-max-pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.default_max_pages
        )));
    }

    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > 32 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-pages must be between 1 and 32, got {}",
            config.max_concurrent_pages
        )));
    }

    if config.max_concurrent_images < 1 || config.max_concurrent_images > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-images must be between 1 and 64, got {}",
            config.max_concurrent_images
        )));
    }

    if config.crawl_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "crawl-timeout-secs must be positive when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.content_dir.is_empty() {
        return Err(ConfigError::Validation(
            "content-dir cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
