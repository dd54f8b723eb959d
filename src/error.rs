//! Error taxonomy shared by every component.
//!
//! Errors are grouped the way callers need to react to them:
//!
//! - **configuration**: a drive has no stored credential ([`Error::NotConfigured`])
//! - **network**: transport failure, non-2xx status, undecodable body
//! - **protocol**: the response decoded but lacks an expected field
//! - **unsupported capability**: unknown protocol variant, scraper or drive
//!
//! Per-provider and per-link failures are isolated by the dispatcher and the
//! resolver; only top-level operations without a smaller unit surface them.

use thiserror::Error;

/// Errors produced by the aggregation and resolution pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A drive was used before a credential was stored for it.
    #[error("{drive} is not configured: no cookie stored")]
    NotConfigured { drive: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response decoded but did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A drive API answered with a non-zero application code.
    #[error("drive API error {code}: {message}")]
    Api { code: i64, message: String },

    /// No handler is registered for a provider's protocol variant.
    #[error("unsupported type: {0}")]
    UnsupportedType(i64),

    /// A secondary-dispatch provider named a scraper that does not exist.
    #[error("unsupported scraper: {0}")]
    UnsupportedSpider(String),

    /// The provider's protocol variant cannot fetch details.
    #[error("detail retrieval is not supported for type {0}")]
    UnsupportedDetail(i64),

    /// The drive is recognised but has no implementation yet.
    #[error("{0} drive is not implemented")]
    UnsupportedDrive(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(String),
}

impl Error {
    /// Shorthand for [`Error::Protocol`].
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Whether this is an unsupported-capability error rather than a failure.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType(_)
                | Self::UnsupportedSpider(_)
                | Self::UnsupportedDetail(_)
                | Self::UnsupportedDrive(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
