use crate::config::types::{Config, ScraperConfig, SelectorConfig, StrategyKind};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Longest politeness pause accepted between detail pages, in seconds
const MAX_DELAY_SECONDS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates scraping limits, URLs and proxy pool
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_http_url("target-url", &config.target_url)?;
    validate_http_url("base-url", &config.base_url)?;

    if config.max_movies < 1 {
        return Err(ConfigError::Validation(format!(
            "max_movies must be >= 1, got {}",
            config.max_movies
        )));
    }

    if config.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "retries must be >= 1, got {}",
            config.retries
        )));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be >= 1, got {}",
            config.timeout_seconds
        )));
    }

    if !config.delay_min.is_finite() || config.delay_min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay_min must be a non-negative number, got {}",
            config.delay_min
        )));
    }

    if !config.delay_max.is_finite() || config.delay_max < config.delay_min {
        return Err(ConfigError::Validation(format!(
            "delay_max must be >= delay_min ({}), got {}",
            config.delay_min, config.delay_max
        )));
    }

    if config.delay_max > MAX_DELAY_SECONDS {
        return Err(ConfigError::Validation(format!(
            "delay_max must be <= {}, got {}",
            MAX_DELAY_SECONDS, config.delay_max
        )));
    }

    for proxy in &config.proxies {
        validate_http_url("proxy", proxy)?;
    }

    if config.strategy == StrategyKind::Rotative && config.proxies.is_empty() {
        return Err(ConfigError::Validation(
            "the rotative strategy requires at least one proxy".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every detail-page selector parses
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for css in [&config.metascore, &config.cast_list, &config.cast_member] {
        parse_selector(css)?;
    }
    Ok(())
}

/// Parses a CSS selector, mapping failures to a configuration error
pub(crate) fn parse_selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Validates an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper_config() -> ScraperConfig {
        ScraperConfig {
            target_url: "https://www.imdb.com/chart/top/".to_string(),
            base_url: "https://www.imdb.com".to_string(),
            strategy: StrategyKind::Standard,
            max_movies: 10,
            retries: 3,
            timeout_seconds: 10,
            delay_min: 1.0,
            delay_max: 3.0,
            max_actors: 5,
            markup_fallback: false,
            proxies: vec![],
        }
    }

    #[test]
    fn test_valid_scraper_config() {
        assert!(validate_scraper_config(&scraper_config()).is_ok());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = scraper_config();
        config.retries = 0;
        assert!(matches!(
            validate_scraper_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_inverted_delay_range_rejected() {
        let mut config = scraper_config();
        config.delay_min = 5.0;
        config.delay_max = 2.0;
        assert!(validate_scraper_config(&config).is_err());
    }

    #[test]
    fn test_oversized_delay_rejected() {
        let mut config = scraper_config();
        config.delay_min = 1.0;
        config.delay_max = 1e20;
        assert!(matches!(
            validate_scraper_config(&config),
            Err(ConfigError::Validation(_))
        ));

        config.delay_max = MAX_DELAY_SECONDS;
        assert!(validate_scraper_config(&config).is_ok());
    }

    #[test]
    fn test_rotative_without_proxies_rejected() {
        let mut config = scraper_config();
        config.strategy = StrategyKind::Rotative;
        assert!(validate_scraper_config(&config).is_err());

        config.proxies = vec!["http://10.0.0.1:3128".to_string()];
        assert!(validate_scraper_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_proxy_url_rejected() {
        let mut config = scraper_config();
        config.proxies = vec!["not a url".to_string()];
        assert!(matches!(
            validate_scraper_config(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let selectors = SelectorConfig {
            metascore: "span[[".to_string(),
            ..SelectorConfig::default()
        };
        assert!(matches!(
            validate_selectors(&selectors),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_default_selectors_parse() {
        assert!(validate_selectors(&SelectorConfig::default()).is_ok());
    }
}
