use crate::config::types::{
    ApiConfig, Config, NetworkConfig, QuotaConfig, SearchConfig, SessionConfig, StreamConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_quota(&config.quota)?;
    validate_session(&config.session)?;
    validate_api(&config.api)?;
    validate_stream(&config.stream)?;
    if let Some(search) = &config.search {
        validate_search(search)?;
    }
    if let Some(network) = &config.network {
        validate_network(network)?;
    }
    validate_output(config)?;
    Ok(())
}

/// Validates quota configuration
fn validate_quota(config: &QuotaConfig) -> Result<(), ConfigError> {
    if config.window_seconds < 1 {
        return Err(ConfigError::Validation(
            "window-seconds must be >= 1".to_string(),
        ));
    }

    if config.max_requests < 1 {
        return Err(ConfigError::Validation(
            "max-requests must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates session configuration
fn validate_session(config: &SessionConfig) -> Result<(), ConfigError> {
    if let Some(limit) = config.limit {
        if limit < 1 {
            return Err(ConfigError::Validation(
                "limit must be >= 1 when set; omit it for an unbounded session".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates API endpoint configuration
fn validate_api(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http(s), got scheme '{}'",
            url.scheme()
        )));
    }

    if config.credentials_path.is_empty() {
        return Err(ConfigError::Validation(
            "credentials-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates stream configuration
fn validate_stream(config: &StreamConfig) -> Result<(), ConfigError> {
    if config.delta_seconds < 1 {
        return Err(ConfigError::Validation(
            "delta-seconds must be >= 1".to_string(),
        ));
    }

    if !(0.0..1.0).contains(&config.dev_ratio) {
        return Err(ConfigError::Validation(format!(
            "dev-ratio must be in [0, 1), got {}",
            config.dev_ratio
        )));
    }

    Ok(())
}

/// Validates search configuration
fn validate_search(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation("query cannot be empty".to_string()));
    }

    if config.count < 1 || config.count > 100 {
        return Err(ConfigError::Validation(format!(
            "count must be between 1 and 100, got {}",
            config.count
        )));
    }

    if config.stop_below_id.is_some() && config.stop_before.is_some() {
        return Err(ConfigError::Validation(
            "stop-below-id and stop-before are mutually exclusive".to_string(),
        ));
    }

    if let Some(stop_before) = &config.stop_before {
        chrono::DateTime::parse_from_rfc3339(stop_before).map_err(|e| {
            ConfigError::Validation(format!(
                "stop-before must be an RFC 3339 timestamp: {}",
                e
            ))
        })?;
    }

    Ok(())
}

/// Validates network configuration
fn validate_network(config: &NetworkConfig) -> Result<(), ConfigError> {
    for account in &config.accounts {
        if account.trim().is_empty() {
            return Err(ConfigError::Validation(
                "network accounts cannot contain empty names".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output(config: &Config) -> Result<(), ConfigError> {
    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
