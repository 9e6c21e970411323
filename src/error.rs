//! Error taxonomy for the scrape pipeline.
//!
//! Transience drives the retry behavior: timeouts and session-level
//! failures are worth another attempt with a fresh browser, while a
//! missing element or malformed numeric text means the page structure
//! no longer matches our assumptions and retrying cannot help.

use thiserror::Error;

/// Failures surfaced by the navigator and the traversal built on it.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A wait for an expected element or condition ran out of time.
    #[error("timed out waiting for '{selector}'")]
    NavigationTimeout { selector: String },

    /// Generic navigator/session failure (launch, CDP transport, crashed tab).
    #[error("navigator session failed: {0}")]
    Session(String),

    /// An element the page structure is assumed to always carry was absent.
    #[error("element not found: '{selector}'")]
    ElementNotFound { selector: String },

    /// Numeric source text that does not match the expected locale format.
    #[error("malformed numeric text: {raw:?}")]
    MalformedNumber { raw: String },

    #[error("I/O failure")]
    Io(#[from] std::io::Error),

    #[error("serialization failure")]
    Serialize(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Shorthand for a timeout on the given selector.
    pub fn timeout(selector: impl Into<String>) -> Self {
        Self::NavigationTimeout { selector: selector.into() }
    }

    /// Shorthand for a structural element-not-found failure.
    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound { selector: selector.into() }
    }

    /// True for failures that a fresh session and another attempt may fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NavigationTimeout { .. } | Self::Session(_))
    }
}
