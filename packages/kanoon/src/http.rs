//! HTTP transport for the Indian Kanoon API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};

use crate::config::KanoonConfig;
use crate::error::Result;

/// User agent string identifying this client.
const USER_AGENT: &str = concat!("kanoon-client/", env!("CARGO_PKG_VERSION"));

/// A single outbound request, no retries.
///
/// The retry loop in [`crate::KanoonClient`] sits on top of this so tests can
/// script failures without a network.
pub trait Transport: Send + Sync {
    /// POST to `path` (path and query, already encoded) and return the body.
    fn post(&self, path: &str) -> Result<String>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post(&self, path: &str) -> Result<String> {
        (**self).post(path)
    }
}

/// Create a configured blocking HTTP client.
pub fn create_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Transport over HTTPS with token authentication.
///
/// NOTE: Do NOT derive `Debug` on this struct: `token` would be exposed.
pub struct HttpsTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpsTransport {
    pub fn new(config: &KanoonConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config.timeout_secs)?,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }
}

impl Transport for HttpsTransport {
    fn post(&self, path: &str) -> Result<String> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(ACCEPT, "application/json")
            .send()?;

        // The status is not the failure signal for this API; the body is.
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = %status, path, "Non-success status from API");
        }

        // Strict decode: `text()` would replace invalid sequences silently
        let bytes = response.bytes()?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

/// Test utilities for the transport.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use std::sync::Mutex;

    use super::Transport;
    use crate::error::{KanoonError, Result};

    /// A scripted reply of [`ScriptedTransport`].
    #[derive(Debug, Clone)]
    pub enum Reply {
        Body(String),
        /// Simulates a connection failure.
        Fail(String),
    }

    /// Transport returning pre-configured replies in order and recording
    /// every requested path.
    ///
    /// Once the script runs out, every further request fails.
    pub struct ScriptedTransport {
        replies: Mutex<Vec<Reply>>,
        paths: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Reply>) -> Self {
            // Reverse so we can pop from the end
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                paths: Mutex::new(Vec::new()),
            }
        }

        pub fn with_body(body: &str) -> Self {
            Self::new(vec![Reply::Body(body.to_string())])
        }

        /// Paths requested so far.
        pub fn paths(&self) -> Vec<String> {
            self.paths.lock().map(|p| p.clone()).unwrap_or_default()
        }

        pub fn attempts(&self) -> usize {
            self.paths().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn post(&self, path: &str) -> Result<String> {
            if let Ok(mut paths) = self.paths.lock() {
                paths.push(path.to_string());
            }

            let reply = self
                .replies
                .lock()
                .map_err(|e| KanoonError::Config(format!("script lock poisoned: {e}")))?
                .pop();

            match reply {
                Some(Reply::Body(body)) => Ok(body),
                Some(Reply::Fail(message)) => Err(KanoonError::Transport(message)),
                None => Err(KanoonError::Transport("script exhausted".into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let client = create_client(5);
        assert!(client.is_ok());
    }

    #[test]
    fn test_https_transport_new() {
        let config = KanoonConfig::new("secret");
        assert!(HttpsTransport::new(&config).is_ok());
    }
}
