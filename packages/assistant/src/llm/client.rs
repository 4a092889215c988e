use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AssistantError, Result};
use crate::llm::config::{LlmConfig, ModelPreference, ProviderConfig};

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Request to the LLM.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Response from the LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Trait for LLM clients, enabling mocking in tests.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for std::sync::Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        (**self).complete(request).await
    }
}

const BASE_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// POST with retries on transport errors, 429 and 5xx. Returns the body of
/// the first 200 response.
async fn send_with_retry<F>(provider: &'static str, build: F) -> Result<String>
where
    F: Fn() -> reqwest::RequestBuilder + Send + Sync,
{
    let max_attempts = BASE_DELAYS.len() + 1;
    let mut last_error: Option<AssistantError> = None;
    let mut next_delay = Duration::ZERO;

    for attempt in 0..max_attempts {
        if attempt > 0 {
            debug!(provider, attempt, "retrying LLM request after {:?}", next_delay);
            tokio::time::sleep(next_delay).await;
        }

        next_delay = BASE_DELAYS
            .get(attempt)
            .copied()
            .unwrap_or(BASE_DELAYS[BASE_DELAYS.len() - 1]);

        let resp = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(provider, attempt, error = %e, "LLM request failed");
                last_error = Some(AssistantError::LlmApiRequest(e));
                continue;
            }
        };

        let status = resp.status().as_u16();

        if status == 429 {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            warn!(provider, attempt, retry_after, "LLM rate limited");
            next_delay = Duration::from_secs(retry_after).max(next_delay);
            last_error = Some(AssistantError::LlmRateLimited {
                retry_after_secs: retry_after,
            });
            continue;
        }

        if status >= 500 {
            let body_text = resp.text().await.unwrap_or_default();
            warn!(provider, attempt, status, body = %body_text, "LLM server error");
            last_error = Some(AssistantError::LlmApiError {
                status,
                message: body_text,
            });
            continue;
        }

        let body_text = resp.text().await?;

        if status != 200 {
            return Err(AssistantError::LlmApiError {
                status,
                message: error_message(&body_text),
            });
        }

        return Ok(body_text);
    }

    Err(last_error.unwrap_or(AssistantError::LlmEmptyResponse))
}

/// Pull a human-readable message out of a provider error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("detail"))
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| body.to_string())
}

fn build_http(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(AssistantError::LlmApiRequest)
}

/// Mistral chat-completions client.
///
/// NOTE: Do NOT derive `Debug` on this struct: `api_key` would be exposed.
pub struct MistralClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
}

#[derive(Serialize)]
struct MistralRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct MistralResponse {
    #[serde(default)]
    choices: Vec<MistralChoice>,
    usage: Option<MistralUsage>,
}

#[derive(Deserialize)]
struct MistralChoice {
    message: MistralMessage,
}

#[derive(Deserialize)]
struct MistralMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct MistralUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl MistralClient {
    pub fn new(provider: &ProviderConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout_secs)?,
            api_key: provider.api_key.clone(),
            api_base_url: provider.api_base_url.clone(),
            model: provider.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for MistralClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.api_base_url);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.is_empty() {
            messages.push(Message {
                role: Role::System,
                content: request.system.clone(),
            });
        }
        messages.extend(request.messages.iter().cloned());

        let body = MistralRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let text = send_with_retry("mistral", || {
            self.http
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&body)
        })
        .await?;

        let api_response: MistralResponse = serde_json::from_str(&text)
            .map_err(|e| AssistantError::LlmResponseParse(e.to_string()))?;

        let content = api_response
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(AssistantError::LlmEmptyResponse);
        }

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

/// Gemini generateContent client.
///
/// NOTE: Do NOT derive `Debug` on this struct: `api_key` would be exposed.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GeminiClient {
    pub fn new(provider: &ProviderConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout_secs)?,
            api_key: provider.api_key.clone(),
            api_base_url: provider.api_base_url.clone(),
            model: provider.model.clone(),
        })
    }
}

fn text_content(role: Option<&str>, text: &str) -> GeminiContent {
    GeminiContent {
        role: role.map(String::from),
        parts: vec![GeminiPart {
            text: Some(text.to_string()),
        }],
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model
        );

        let contents = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    Role::User | Role::System => "user",
                };
                text_content(Some(role), &m.content)
            })
            .collect();

        let body = GeminiRequest {
            system_instruction: (!request.system.is_empty())
                .then(|| text_content(None, &request.system)),
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let text = send_with_retry("gemini", || {
            self.http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&body)
        })
        .await?;

        let api_response: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| AssistantError::LlmResponseParse(e.to_string()))?;

        let content = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AssistantError::LlmEmptyResponse);
        }

        let (input_tokens, output_tokens) = api_response
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

/// The configured providers, picked per request by [`ModelPreference`].
#[derive(Default)]
pub struct LlmRouter {
    mistral: Option<Box<dyn LlmClient>>,
    gemini: Option<Box<dyn LlmClient>>,
}

impl LlmRouter {
    /// Build clients for every provider that has credentials.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut router = Self::default();
        if let Some(provider) = &config.mistral {
            router.mistral = Some(Box::new(MistralClient::new(provider, config.timeout_secs)?));
        }
        if let Some(provider) = &config.gemini {
            router.gemini = Some(Box::new(GeminiClient::new(provider, config.timeout_secs)?));
        }
        Ok(router)
    }

    pub fn with_client(mut self, model: ModelPreference, client: Box<dyn LlmClient>) -> Self {
        match model {
            ModelPreference::Mistral => self.mistral = Some(client),
            ModelPreference::Gemini => self.gemini = Some(client),
        }
        self
    }

    fn get(&self, model: ModelPreference) -> Option<&dyn LlmClient> {
        match model {
            ModelPreference::Mistral => self.mistral.as_deref(),
            ModelPreference::Gemini => self.gemini.as_deref(),
        }
    }

    /// The preferred client, or the other one if the preferred provider is
    /// not configured. Also returns which provider was chosen.
    pub fn select(&self, preference: ModelPreference) -> Option<(ModelPreference, &dyn LlmClient)> {
        self.get(preference)
            .map(|c| (preference, c))
            .or_else(|| {
                let other = preference.fallback();
                self.get(other).map(|c| (other, c))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.mistral.is_none() && self.gemini.is_none()
    }
}

/// Test utilities for the LLM client.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Mock LLM client for testing. Returns pre-configured responses in order
    /// and keeps the requests it received.
    pub struct MockLlmClient {
        responses: Mutex<Vec<Result<LlmResponse>>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<Result<LlmResponse>>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(content: &str) -> Self {
            Self::new(vec![Ok(LlmResponse {
                content: content.to_string(),
                input_tokens: 100,
                output_tokens: 200,
            })])
        }

        pub fn failing() -> Self {
            Self::new(vec![Err(AssistantError::LlmApiError {
                status: 400,
                message: "bad request".into(),
            })])
        }

        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let mut responses = self.responses.lock().map_err(|e| {
                AssistantError::LlmResponseParse(format!("mock lock poisoned: {e}"))
            })?;
            responses.pop().unwrap_or(Err(AssistantError::LlmEmptyResponse))
        }
    }
}
