use crate::config::types::{Config, CrawlerConfig, OutputConfig, SeedEntry, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.task_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "task_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.fetch_timeout_secs == 0 || config.robots_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch and robots timeouts must be >= 1 second".to_string(),
        ));
    }

    if config.queue_capacity == 0 {
        return Err(ConfigError::Validation(
            "queue_capacity must be >= 1".to_string(),
        ));
    }

    if config.monitor_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "monitor_interval_secs must be >= 1".to_string(),
        ));
    }

    if config.max_runtime_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_runtime_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Robots.txt group matching keys off this token, so keep it plain
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed list
///
/// Individual seeds are not parsed here: a bad seed is skipped when the
/// crawl is seeded, it does not invalidate the whole run.
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[seed]] entry is required".to_string(),
        ));
    }

    if let Some(entry) = seeds.iter().find(|entry| entry.url.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "seed URL cannot be empty: {:?}",
            entry
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config::with_seeds(["https://shop.example.com/"])
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = valid_config();
        config.crawler.workers = 0;
        assert!(validate(&config).is_err());

        config.crawler.workers = 101;
        assert!(validate(&config).is_err());

        config.crawler.workers = 100;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let mut config = valid_config();
        config.crawler.queue_capacity = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_runtime_rejected() {
        let mut config = valid_config();
        config.crawler.max_runtime_secs = Some(0);
        assert!(validate(&config).is_err());

        config.crawler.max_runtime_secs = Some(60);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = valid_config();
        config.user_agent.crawler_name = "Bad Bot".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = "Good-Bot_2".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_contact_url() {
        let mut config = valid_config();
        config.user_agent.contact_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_seeds_required() {
        let mut config = valid_config();
        config.seeds.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unparsable_seed_is_not_a_validation_error() {
        let config = Config::with_seeds(["::not-a-url::", "https://shop.example.com/"]);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_output_path_rejected() {
        let mut config = valid_config();
        config.output.path = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
