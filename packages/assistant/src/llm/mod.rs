mod client;
mod config;
mod prompt;

#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::MockLlmClient;
pub use client::{
    GeminiClient, LlmClient, LlmRequest, LlmResponse, LlmRouter, Message, MistralClient, Role,
};
pub use config::{LlmConfig, ModelPreference, ProviderConfig};
pub use prompt::{build_answer_prompt, build_system_prompt, strip_tags, MAX_CONTEXT_HITS};
