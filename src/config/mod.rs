//! Configuration management for restofeed
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use restofeed::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Listing served from: {}", config.client.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `RESTOFEED__<section>__<key>`
//!
//! Examples:
//! - `RESTOFEED__CLIENT__BASE_URL=http://localhost:8080/`
//! - `RESTOFEED__CLIENT__REQUEST_TIMEOUT_SECS=5`
//! - `RESTOFEED__CACHE__MAX_BYTES=64MB`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/restofeed.toml`.
//! This can be overridden using the `RESTOFEED_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{CacheConfig, ClientConfig, Config};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation (unparsable base URL, zero timeout, ...).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
