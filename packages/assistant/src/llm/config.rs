use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const MISTRAL_API_BASE_URL: &str = "https://api.mistral.ai";
pub const MISTRAL_DEFAULT_MODEL: &str = "mistral-large-latest";
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Which provider answers a chat request.
///
/// Chosen per request by the caller; nothing in the process remembers it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModelPreference {
    #[default]
    Mistral,
    Gemini,
}

impl ModelPreference {
    /// The other provider, used when the preferred one is not configured.
    pub fn fallback(self) -> Self {
        match self {
            ModelPreference::Mistral => ModelPreference::Gemini,
            ModelPreference::Gemini => ModelPreference::Mistral,
        }
    }
}

/// Credentials and endpoint of one provider.
///
/// NOTE: `Debug` is implemented by hand so `api_key` is never printed.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl ProviderConfig {
    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: MISTRAL_DEFAULT_MODEL.into(),
            api_base_url: MISTRAL_API_BASE_URL.into(),
        }
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: GEMINI_DEFAULT_MODEL.into(),
            api_base_url: GEMINI_API_BASE_URL.into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Configuration for answer generation.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub mistral: Option<ProviderConfig>,
    pub gemini: Option<ProviderConfig>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mistral: None,
            gemini: None,
            temperature: 0.2,
            max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// A provider is configured only when its API key is set. Having none
    /// is not an error: answers are then skipped.
    pub fn from_env() -> Self {
        let mistral = std::env::var("MISTRAL_API_KEY").ok().map(|key| {
            let mut provider = ProviderConfig::mistral(key);
            if let Ok(model) = std::env::var("MISTRAL_MODEL") {
                provider = provider.with_model(model);
            }
            if let Ok(url) = std::env::var("MISTRAL_API_BASE_URL") {
                provider = provider.with_api_base_url(url);
            }
            provider
        });

        let gemini = std::env::var("GEMINI_API_KEY").ok().map(|key| {
            let mut provider = ProviderConfig::gemini(key);
            if let Ok(model) = std::env::var("GEMINI_MODEL") {
                provider = provider.with_model(model);
            }
            if let Ok(url) = std::env::var("GEMINI_API_BASE_URL") {
                provider = provider.with_api_base_url(url);
            }
            provider
        });

        let defaults = Self::default();

        let temperature = std::env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.temperature);

        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            mistral,
            gemini,
            temperature,
            max_tokens,
            timeout_secs,
        }
    }

    pub fn with_mistral(mut self, provider: ProviderConfig) -> Self {
        self.mistral = Some(provider);
        self
    }

    pub fn with_gemini(mut self, provider: ProviderConfig) -> Self {
        self.gemini = Some(provider);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
