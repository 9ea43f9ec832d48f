//! Failure kinds surfaced to callers of the transport and data service

use reqwest::StatusCode;
use thiserror::Error;

/// Response descriptor kept for diagnostics when a request completes
/// outside the 2xx range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub url: String,
}

impl ResponseMeta {
    pub fn new(status: StatusCode, url: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }
}

impl std::fmt::Display for ResponseMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HTTP {} {} ({})",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("Unknown"),
            self.url
        )
    }
}

/// Closed set of outcomes delivered through `on_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Malformed input, e.g. a URL that does not parse. No request was sent.
    #[error("client error: {0}")]
    Client(String),

    /// Transport-level failure that was not a cancellation.
    #[error("server error: {0}")]
    Server(String),

    /// A response arrived but its status is outside 200..=299.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(ResponseMeta),

    /// The payload arrived but could not be decoded into the expected type.
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Client(_) => "CLIENT_ERROR",
            FetchError::Server(_) => "SERVER_ERROR",
            FetchError::UnexpectedResponse(_) => "UNEXPECTED_RESPONSE",
            FetchError::Decode(_) => "DECODE_ERROR",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        FetchError::Decode(value.to_string())
    }
}

/// Errors raised while wiring up a transport, before any request is made.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("HTTP client build failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
