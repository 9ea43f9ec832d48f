use super::models::{CacheConfig, ClientConfig, Config};
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("base_url '{url}' is not a valid URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("base_url scheme '{scheme}' is not supported, expected http or https")]
    UnsupportedScheme { scheme: String },

    #[error("listing_path '{path}' must be relative to base_url")]
    AbsoluteListingPath { path: String },

    #[error("{field} must be positive")]
    ZeroTimeout { field: &'static str },

    #[error("cache.{field} must be positive")]
    ZeroCacheBound { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_client(&config.client)?;
    validate_cache(&config.cache)?;
    Ok(())
}

fn validate_client(client: &ClientConfig) -> Result<(), ValidationError> {
    let base = Url::parse(&client.base_url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: client.base_url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            scheme: base.scheme().to_string(),
        });
    }

    if client.listing_path.starts_with('/') || client.listing_path.contains("://") {
        return Err(ValidationError::AbsoluteListingPath {
            path: client.listing_path.clone(),
        });
    }

    if client.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "client.connect_timeout_secs",
        });
    }
    if client.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "client.request_timeout_secs",
        });
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ValidationError> {
    if cache.max_entries == 0 {
        return Err(ValidationError::ZeroCacheBound { field: "max_entries" });
    }
    if cache.max_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroCacheBound { field: "max_bytes" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_unparsable_base_url() {
        let mut config = Config::default();
        config.client.base_url = "not a url".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = Config::default();
        config.client.base_url = "ftp://files.example.com/".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::UnsupportedScheme { scheme }) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_rejects_absolute_listing_path() {
        let mut config = Config::default();
        config.client.listing_path = "/TFTest/test.json".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::AbsoluteListingPath { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_timeouts_and_bounds() {
        let mut config = Config::default();
        config.client.request_timeout_secs = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroTimeout { field: "client.request_timeout_secs" })
        ));

        let mut config = Config::default();
        config.cache.max_bytes = ByteSize(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroCacheBound { field: "max_bytes" })
        ));
    }
}
