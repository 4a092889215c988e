//! Configuration constants, request path builders and filter validation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use url::form_urlencoded;

use crate::error::{KanoonError, Result};

/// Base URL of the Indian Kanoon API.
pub const KANOON_API_BASE_URL: &str = "https://api.indiankanoon.org";

/// HTTP timeout in seconds for a single attempt.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Number of attempts before a call degrades to the sentinel payload.
pub const MAX_ATTEMPTS: u32 = 10;

/// Backoff step in seconds. The wait after the n-th failure is `n * step`.
pub const BACKOFF_STEP_SECS: u64 = 5;

/// Upper bound the API accepts for `maxpages`.
pub const MAX_SEARCH_PAGES: u32 = 100;

/// Prefix of the plain-text pages the edge proxy in front of the API
/// serves, sometimes with HTTP 200, instead of a JSON payload.
pub const ERROR_CODE_MARKER: &str = "error code:";

/// Message carried by the sentinel payload once all attempts failed.
pub const EXHAUSTED_MESSAGE: &str =
    "Failed to connect to Indian Kanoon API after multiple attempts";

/// Date filter pattern: DD-MM-YYYY, day and month may omit the leading zero.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").expect("valid regex"));

/// Runtime configuration of the Kanoon client.
///
/// `Debug` is implemented by hand so the API token never ends up in logs.
#[derive(Clone)]
pub struct KanoonConfig {
    pub token: String,
    pub base_url: String,
    pub max_pages: u32,
    pub max_cites: u32,
    pub max_cited_by: u32,
    pub timeout_secs: u64,
}

impl fmt::Debug for KanoonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KanoonConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_pages", &self.max_pages)
            .field("max_cites", &self.max_cites)
            .field("max_cited_by", &self.max_cited_by)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl KanoonConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("KANOON_API_TOKEN")
            .map_err(|_| KanoonError::Config("KANOON_API_TOKEN not set".into()))?;

        let base_url = std::env::var("KANOON_API_BASE_URL")
            .unwrap_or_else(|_| KANOON_API_BASE_URL.into());

        let max_pages = std::env::var("KANOON_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let max_cites = std::env::var("KANOON_MAX_CITES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let max_cited_by = std::env::var("KANOON_MAX_CITED_BY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let timeout_secs = std::env::var("KANOON_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(HTTP_TIMEOUT_SECS);

        Ok(Self::new(token)
            .with_base_url(base_url)
            .with_max_pages(max_pages)
            .with_max_cites(max_cites)
            .with_max_cited_by(max_cited_by)
            .with_timeout_secs(timeout_secs))
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: KANOON_API_BASE_URL.into(),
            max_pages: 1,
            max_cites: 0,
            max_cited_by: 0,
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set `maxpages` for searches, capped at [`MAX_SEARCH_PAGES`].
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.min(MAX_SEARCH_PAGES);
        self
    }

    pub fn with_max_cites(mut self, max_cites: u32) -> Self {
        self.max_cites = max_cites;
        self
    }

    pub fn with_max_cited_by(mut self, max_cited_by: u32) -> Self {
        self.max_cited_by = max_cited_by;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Percent-encode free text for a query parameter, space becoming `+`.
///
/// # Examples
/// ```
/// use kanoon_client::config::quote_plus;
///
/// assert_eq!(quote_plus("right to privacy"), "right+to+privacy");
/// assert_eq!(quote_plus("Section 302 & 34"), "Section+302+%26+34");
/// ```
pub fn quote_plus(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

/// Build the search path.
///
/// `form_input` is raw text; it is encoded here, before the path ever
/// reaches the retry loop.
pub fn search_path(form_input: &str, pagenum: u32, maxpages: u32) -> String {
    format!(
        "/search/?formInput={}&pagenum={pagenum}&maxpages={maxpages}",
        quote_plus(form_input)
    )
}

/// Build the document path. Citation limits are only sent when positive.
///
/// # Examples
/// ```
/// use kanoon_client::config::doc_path;
///
/// assert_eq!(doc_path(1234, 0, 0), "/doc/1234/");
/// assert_eq!(doc_path(1234, 5, 0), "/doc/1234/?maxcites=5");
/// assert_eq!(doc_path(1234, 5, 3), "/doc/1234/?maxcites=5&maxcitedby=3");
/// ```
pub fn doc_path(docid: u64, maxcites: u32, maxcitedby: u32) -> String {
    let mut args = Vec::new();
    if maxcites > 0 {
        args.push(format!("maxcites={maxcites}"));
    }
    if maxcitedby > 0 {
        args.push(format!("maxcitedby={maxcitedby}"));
    }

    let path = format!("/doc/{docid}/");
    if args.is_empty() {
        path
    } else {
        format!("{path}?{}", args.join("&"))
    }
}

/// Build the path for the fragments of a document matching a query.
pub fn doc_fragment_path(docid: u64, form_input: &str) -> String {
    format!("/docfragment/{docid}/?formInput={}", quote_plus(form_input))
}

/// Build the path for document metadata.
pub fn doc_meta_path(docid: u64) -> String {
    format!("/docmeta/{docid}/")
}

/// Build the path for the original (court-issued) document.
pub fn orig_doc_path(docid: u64) -> String {
    format!("/origdoc/{docid}/")
}

/// Validate a date filter (DD-MM-YYYY) and check it names a real day.
///
/// # Examples
/// ```
/// use kanoon_client::config::validate_date;
///
/// assert!(validate_date("15-08-2019").is_ok());
/// assert!(validate_date("1-1-2020").is_ok());
/// assert!(validate_date("2019-08-15").is_err());
/// assert!(validate_date("31-02-2020").is_err());
/// ```
pub fn validate_date(date_str: &str) -> Result<()> {
    if !DATE_PATTERN.is_match(date_str) {
        return Err(KanoonError::InvalidDate(date_str.to_string()));
    }

    chrono::NaiveDate::parse_from_str(date_str, "%d-%m-%Y")
        .map_err(|_| KanoonError::InvalidDate(date_str.to_string()))?;

    Ok(())
}

/// Validate a sort order.
pub fn validate_sort_by(sort_by: &str) -> Result<()> {
    match sort_by {
        "mostrecent" | "leastrecent" => Ok(()),
        other => Err(KanoonError::InvalidSortBy(other.to_string())),
    }
}
