use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP client settings shared by the listing request and image downloads
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base location the listing path is appended to (keep the trailing slash)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_listing_path")]
    pub listing_path: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Fixed header set attached to typed requests
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_path: default_listing_path(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            headers: default_headers(),
        }
    }
}

fn default_base_url() -> String {
    "https://alanflament.github.io/".to_string()
}

fn default_listing_path() -> String {
    "TFTest/test.json".to_string()
}

fn default_user_agent() -> String {
    concat!("restofeed/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "content-type".to_string(),
        mime::APPLICATION_JSON.to_string(),
    )])
}

/// In-memory image cache bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: ByteSize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_max_entries() -> usize {
    256
}

fn default_max_bytes() -> ByteSize {
    ByteSize(32 * 1024 * 1024) // 32 MB
}
