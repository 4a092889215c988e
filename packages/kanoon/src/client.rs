//! Resilient API client: bounded retry with linear backoff.
//!
//! Every call returns text. Transport errors, empty bodies and edge-proxy
//! error pages are retried; once the attempts are spent the call returns
//! the sentinel `{"errmsg": ...}` payload instead of an error.

use std::thread;
use std::time::Duration;

use crate::config::{
    doc_fragment_path, doc_meta_path, doc_path, orig_doc_path, search_path, KanoonConfig,
    BACKOFF_STEP_SECS, ERROR_CODE_MARKER, EXHAUSTED_MESSAGE, MAX_ATTEMPTS,
};
use crate::error::{KanoonError, Result};
use crate::http::{HttpsTransport, Transport};
use crate::types::SearchQuery;

/// Sleep hook used between attempts.
pub type SleepFn = Box<dyn Fn(Duration) + Send + Sync>;

/// Attempt ceiling and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            step: Duration::from_secs(BACKOFF_STEP_SECS),
        }
    }
}

impl RetryPolicy {
    /// Wait after the `attempt_count`-th consecutive failure.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use kanoon_client::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_for(1), Duration::from_secs(5));
    /// assert_eq!(policy.delay_for(10), Duration::from_secs(50));
    /// ```
    pub fn delay_for(&self, attempt_count: u32) -> Duration {
        self.step * attempt_count
    }
}

/// True when a body is a plain-text edge-proxy error page.
///
/// The proxy in front of the API can answer HTTP 200 with a body such as
/// `error code: 1020`. Only a match at the very start counts.
pub fn is_error_page(body: &str) -> bool {
    body.starts_with(ERROR_CODE_MARKER)
}

/// The payload returned in place of a result once retries are exhausted.
///
/// # Examples
/// ```
/// let payload = kanoon_client::sentinel_payload("gave up");
/// assert_eq!(payload, r#"{"errmsg":"gave up"}"#);
/// ```
pub fn sentinel_payload(message: &str) -> String {
    serde_json::json!({ "errmsg": message }).to_string()
}

/// Client for the Indian Kanoon API.
///
/// Holds no state between calls; each call keeps its own attempt counter.
pub struct KanoonClient {
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
    sleep: SleepFn,
    max_pages: u32,
    max_cites: u32,
    max_cited_by: u32,
}

impl KanoonClient {
    /// Create a client talking HTTPS to the configured host.
    pub fn new(config: &KanoonConfig) -> Result<Self> {
        let transport = HttpsTransport::new(config)?;
        Ok(Self::with_transport(Box::new(transport), config))
    }

    /// Create a client over any transport, sleeping on the current thread.
    pub fn with_transport(transport: Box<dyn Transport>, config: &KanoonConfig) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            sleep: Box::new(thread::sleep),
            max_pages: config.max_pages,
            max_cites: config.max_cites,
            max_cited_by: config.max_cited_by,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the sleep between attempts, e.g. with a recorder in tests.
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Issue one logical call, retrying failures up to the attempt ceiling.
    ///
    /// # Arguments
    /// * `path` - Request path plus query string, already percent-encoded
    ///
    /// # Returns
    /// The raw response body, or the sentinel payload after the last failed
    /// attempt. Never fails.
    pub fn call(&self, path: &str) -> String {
        let mut attempt_count: u32 = 0;

        while attempt_count < self.policy.max_attempts {
            match self.attempt(path) {
                Ok(body) => {
                    if attempt_count > 0 {
                        tracing::debug!(
                            path,
                            attempts = attempt_count + 1,
                            "Call succeeded after retry"
                        );
                    }
                    return body;
                }
                Err(e) => {
                    attempt_count += 1;
                    let delay = self.policy.delay_for(attempt_count);
                    tracing::warn!(
                        path,
                        error = %e,
                        attempt = attempt_count,
                        max_attempts = self.policy.max_attempts,
                        delay_secs = delay.as_secs(),
                        "Error in API call, will retry"
                    );
                    (self.sleep)(delay);
                }
            }
        }

        tracing::error!(path, attempts = attempt_count, "API call failed after all attempts");
        sentinel_payload(EXHAUSTED_MESSAGE)
    }

    /// One attempt, classifying the body.
    fn attempt(&self, path: &str) -> Result<String> {
        let body = self.transport.post(path)?;

        if body.is_empty() {
            return Err(KanoonError::EmptyBody);
        }
        if is_error_page(&body) {
            return Err(KanoonError::UpstreamErrorPage(first_line(&body).to_string()));
        }

        Ok(body)
    }

    /// Search, returning the raw JSON text (or the sentinel).
    ///
    /// # Arguments
    /// * `query` - Free text and filters; encoded here
    /// * `pagenum` - Zero-based result page
    pub fn search(&self, query: &SearchQuery, pagenum: u32) -> String {
        let path = search_path(&query.form_input(), pagenum, self.max_pages);
        self.call(&path)
    }

    /// Fetch a document with the configured citation limits.
    pub fn fetch_doc(&self, docid: u64) -> String {
        self.call(&doc_path(docid, self.max_cites, self.max_cited_by))
    }

    /// Fetch the fragments of a document that match `query`.
    pub fn fetch_doc_fragment(&self, docid: u64, query: &str) -> String {
        self.call(&doc_fragment_path(docid, query))
    }

    /// Fetch document metadata.
    pub fn fetch_doc_meta(&self, docid: u64) -> String {
        self.call(&doc_meta_path(docid))
    }

    /// Fetch the original court copy of a document.
    pub fn fetch_orig_doc(&self, docid: u64) -> String {
        self.call(&orig_doc_path(docid))
    }
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or(body).trim()
}
