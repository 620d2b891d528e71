use crate::config::types::{
    BrowserSettings, Config, DelayRange, HttpConfig, Locator, OutputConfig, SelectorConfig,
    SiteConfig, StaticPageConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    validate_http_config(&config.http)?;
    validate_browser_settings(&config.browser)?;
    validate_selectors(&config.selectors)?;
    validate_static_page(&config.static_page)?;
    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("search-url", &config.search_url)?;
    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("listing-path", &config.listing_path),
        ("details-path", &config.details_path),
        ("partial-path", &config.partial_path),
        ("log-path", &config.log_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.partial_save_every < 1 {
        return Err(ConfigError::Validation(format!(
            "partial-save-every must be >= 1, got {}",
            config.partial_save_every
        )));
    }

    // Free-text addresses contain commas, so the separator must not be one
    let delimiter = config.delimiter;
    if !delimiter.is_ascii() || matches!(delimiter, ',' | '"' | '\n' | '\r') {
        return Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character other than comma, quote or newline, got {:?}",
            delimiter
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_browser_settings(config: &BrowserSettings) -> Result<(), ConfigError> {
    if config.wait_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "wait-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be >= 1".to_string(),
        ));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(
            "window dimensions must be non-zero".to_string(),
        ));
    }

    validate_delay("settle-delay", &config.settle_delay)?;
    validate_delay("installation-delay", &config.installation_delay)?;
    validate_delay("committee-delay", &config.committee_delay)?;

    Ok(())
}

fn validate_delay(name: &str, delay: &DelayRange) -> Result<(), ConfigError> {
    if delay.min_ms > delay.max_ms {
        return Err(ConfigError::Validation(format!(
            "{}: min-ms ({}) must not exceed max-ms ({})",
            name, delay.min_ms, delay.max_ms
        )));
    }
    Ok(())
}

fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, locator) in [
        ("popup", &config.popup),
        ("search-toggle", &config.search_toggle),
        ("expanded-search-panel", &config.expanded_search_panel),
        ("submit-button", &config.submit_button),
        ("results", &config.results),
        ("name-link", &config.name_link),
        ("summary-fields", &config.summary_fields),
        ("image", &config.image),
        ("installation-tab", &config.installation_tab),
        ("installation-panel", &config.installation_panel),
        ("installation-block", &config.installation_block),
        ("installation-value", &config.installation_value),
        ("committee-tab", &config.committee_tab),
        ("committee-panel", &config.committee_panel),
        ("president-panel", &config.president_panel),
        ("president-name", &config.president_name),
    ] {
        validate_locator(name, locator)?;
    }

    if config.detail_url_attribute.trim().is_empty() {
        return Err(ConfigError::Validation(
            "detail-url-attribute cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_locator(name: &str, locator: &Locator) -> Result<(), ConfigError> {
    if locator.value().trim().is_empty() {
        return Err(ConfigError::InvalidSelector(format!(
            "{} has an empty {} locator",
            name,
            locator.kind()
        )));
    }

    // CSS can be checked offline; XPath is only checked by the browser
    if let Locator::Css(css) = locator {
        Selector::parse(css).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, css, e))
        })?;
    }

    Ok(())
}

fn validate_static_page(config: &StaticPageConfig) -> Result<(), ConfigError> {
    for (name, css) in [
        ("heading", &config.heading),
        ("info-values", &config.info_values),
        ("members-rows", &config.members_rows),
    ] {
        validate_locator(name, &Locator::Css(css.clone()))?;
    }
    Ok(())
}
