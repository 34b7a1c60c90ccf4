use crate::config::types::{Config, HarvesterConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_harvester_config(&config.harvester)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target-site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if !config.index_path_template.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "index-path-template must contain a {{page}} placeholder, got '{}'",
            config.index_path_template
        )));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(
            "start-page must be >= 1".to_string(),
        ));
    }

    if config.start_page > config.end_page {
        return Err(ConfigError::Validation(format!(
            "start-page ({}) must not exceed end-page ({})",
            config.start_page, config.end_page
        )));
    }

    Ok(())
}

/// Validates harvester behavior settings
fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.max_fetches_per_host < 1 {
        return Err(ConfigError::Validation(format!(
            "max-fetches-per-host must be >= 1, got {}",
            config.max_fetches_per_host
        )));
    }

    if config.max_retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retry-attempts must be >= 1, got {}",
            config.max_retry_attempts
        )));
    }

    if config.persist_every < 1 {
        return Err(ConfigError::Validation(format!(
            "persist-every must be >= 1, got {}",
            config.persist_every
        )));
    }

    Ok(())
}

/// Validates output paths
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records-path cannot be empty".to_string(),
        ));
    }

    if config.progress_path.is_empty() {
        return Err(ConfigError::Validation(
            "progress-path cannot be empty".to_string(),
        ));
    }

    if config.failed_path.is_empty() {
        return Err(ConfigError::Validation(
            "failed-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            site: SiteConfig {
                base_url: "https://birja-in.az".to_string(),
                index_path_template: "/elanlar/num{page}.html".to_string(),
                start_page: 1,
                end_page: 55,
            },
            harvester: HarvesterConfig::default(),
            output: OutputConfig {
                records_path: "./records.csv".to_string(),
                progress_path: "./progress.json".to_string(),
                failed_path: "./failed.json".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_unparseable_base_url_rejected() {
        let mut config = valid_config();
        config.site.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut config = valid_config();
        config.site.base_url = "ftp://birja-in.az".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let mut config = valid_config();
        config.site.index_path_template = "/elanlar/num1.html".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_page_range_rejected() {
        let mut config = valid_config();
        config.site.start_page = 10;
        config.site.end_page = 5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = valid_config();
        config.harvester.max_concurrent_fetches = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_retry_attempts_rejected() {
        let mut config = valid_config();
        config.harvester.max_retry_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_output_path_rejected() {
        let mut config = valid_config();
        config.output.records_path = String::new();
        assert!(validate(&config).is_err());
    }
}
