use std::str::FromStr;

use kanoon_client::KanoonConfig;

use crate::error::{AssistantError, Result};
use crate::llm::{LlmConfig, ModelPreference};

/// Default token-classification model.
pub const DEFAULT_NER_MODEL: &str = "dslim/bert-base-NER";

/// Default address of the classifier sidecar.
pub const DEFAULT_NER_ENDPOINT: &str = "http://localhost:8080/classify";

/// Input length limit of BERT-style models, in tokens.
pub const DEFAULT_NER_MAX_LENGTH: usize = 512;

/// Messages placed in the search slot of a chat response.
pub const NO_ENTITIES_MESSAGE: &str = "No relevant entities found to search Indian Kanoon.";
pub const DECODE_FAILED_MESSAGE: &str = "Failed to decode Indian Kanoon response.";

#[derive(Debug, Clone)]
pub struct NerConfig {
    pub endpoint: String,
    pub model: String,
    pub max_length: usize,
    pub timeout_secs: u64,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_NER_ENDPOINT.into(),
            model: DEFAULT_NER_MODEL.into(),
            max_length: DEFAULT_NER_MAX_LENGTH,
            timeout_secs: 30,
        }
    }
}

impl NerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let endpoint = std::env::var("NER_ENDPOINT").unwrap_or(defaults.endpoint);
        let model = std::env::var("NER_MODEL").unwrap_or(defaults.model);

        let timeout_secs = std::env::var("NER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            endpoint,
            model,
            max_length: defaults.max_length,
            timeout_secs,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Everything the assistant needs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub kanoon: KanoonConfig,
    pub ner: NerConfig,
    pub llm: LlmConfig,
    /// Used when a request does not name a provider.
    pub default_model: ModelPreference,
}

impl AssistantConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let kanoon = KanoonConfig::from_env()?;

        let default_model = match std::env::var("MODEL_PREFERENCE") {
            Ok(value) => ModelPreference::from_str(&value).map_err(|_| {
                AssistantError::Config(format!(
                    "MODEL_PREFERENCE must be 'mistral' or 'gemini', got '{value}'"
                ))
            })?,
            Err(_) => ModelPreference::default(),
        };

        Ok(Self {
            kanoon,
            ner: NerConfig::from_env(),
            llm: LlmConfig::from_env(),
            default_model,
        })
    }
}
