use crate::config::types::{
    Config, CrawlerConfig, HttpConfig, OutputConfig, PolitenessConfig, RetryConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_politeness_config(&config.politeness)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates worker pool configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.max_concurrent_frontiers < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_frontiers must be >= 1, got {}",
            config.max_concurrent_frontiers
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

/// Validates per-host pacing
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if config.min_request_spacing_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "min_request_spacing_ms must be >= 100ms, got {}ms",
            config.min_request_spacing_ms
        )));
    }

    if config.max_in_flight_per_host < 1 || config.max_in_flight_per_host > 16 {
        return Err(ConfigError::Validation(format!(
            "max_in_flight_per_host must be between 1 and 16, got {}",
            config.max_in_flight_per_host
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    for agent in &config.user_agents {
        validate_user_agent(agent)?;
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_multiplier < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1, got {}",
            config.backoff_multiplier
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// A user agent must be a non-empty, single-line header value
fn validate_user_agent(agent: &str) -> Result<(), ConfigError> {
    if agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent entries cannot be empty".to_string(),
        ));
    }

    if agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user agent contains control characters: '{}'",
            agent.escape_debug()
        )));
    }

    Ok(())
}
