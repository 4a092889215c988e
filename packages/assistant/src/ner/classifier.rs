use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::NerConfig;
use crate::error::{AssistantError, Result};
use crate::ner::types::{ClassifierOutput, TokenLabel};

/// A pretrained token-classification model, treated as a black box.
#[async_trait]
pub trait TokenClassifier: Send + Sync {
    /// Tokenize `text` and tag each subword token.
    async fn classify(&self, text: &str) -> Result<Vec<TokenLabel>>;
}

/// Classifier served over HTTP by a model sidecar.
///
/// The sidecar receives `{"inputs", "model", "max_length"}` and answers
/// with the parallel `tokens` / `labels` arrays of the model.
pub struct HttpTokenClassifier {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    max_length: usize,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    model: &'a str,
    max_length: usize,
}

impl HttpTokenClassifier {
    pub fn new(config: &NerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::ClassifierRequest(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_length: config.max_length,
        })
    }
}

#[async_trait]
impl TokenClassifier for HttpTokenClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<TokenLabel>> {
        let body = ClassifyRequest {
            inputs: text,
            model: &self.model,
            max_length: self.max_length,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::ClassifierRequest(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(AssistantError::ClassifierRequest(format!(
                "status {status}: {body_text}"
            )));
        }

        let output: ClassifierOutput = resp
            .json()
            .await
            .map_err(|e| AssistantError::ClassifierRequest(e.to_string()))?;

        debug!(tokens = output.tokens.len(), "classifier output received");
        output.into_token_labels()
    }
}

/// Test utilities for the classifier.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;

    /// Classifier returning a fixed tagging regardless of input.
    pub struct MockClassifier {
        output: Option<Vec<TokenLabel>>,
    }

    impl MockClassifier {
        pub fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                output: Some(pairs.iter().map(|(t, g)| TokenLabel::new(*t, *g)).collect()),
            }
        }

        /// A classifier whose every call fails.
        pub fn failing() -> Self {
            Self { output: None }
        }
    }

    #[async_trait]
    impl TokenClassifier for MockClassifier {
        async fn classify(&self, _text: &str) -> Result<Vec<TokenLabel>> {
            self.output
                .clone()
                .ok_or_else(|| AssistantError::ClassifierRequest("model unavailable".into()))
        }
    }
}
