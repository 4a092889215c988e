//! Error types for the Kanoon client.
//!
//! Most of these never reach a caller of [`crate::KanoonClient::call`]:
//! the retry loop uses them to describe a failed attempt and then folds
//! them into the sentinel payload. Path builders and configuration return
//! them directly.

use thiserror::Error;

/// Main error type for the Kanoon client library.
#[derive(Debug, Error)]
pub enum KanoonError {
    /// HTTP transport failed (connect, TLS, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failed outside of reqwest (alternate transports, tests).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The upstream edge proxy answered with a plain-text error page.
    #[error("upstream returned an error page: {0}")]
    UpstreamErrorPage(String),

    /// The upstream answered with an empty body.
    #[error("upstream returned an empty body")]
    EmptyBody,

    /// The response body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Invalid date filter.
    #[error("Invalid date format: '{0}'. Expected DD-MM-YYYY (e.g., 15-08-2019)")]
    InvalidDate(String),

    /// Invalid sort order.
    #[error("Invalid sort order: '{0}'. Expected mostrecent or leastrecent")]
    InvalidSortBy(String),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for Kanoon client operations.
pub type Result<T> = std::result::Result<T, KanoonError>;
