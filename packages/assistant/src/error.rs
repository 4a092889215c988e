use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("search client error: {0}")]
    Search(#[from] kanoon_client::KanoonError),

    #[error("classifier request failed: {0}")]
    ClassifierRequest(String),

    #[error("classifier returned {tokens} tokens but {labels} labels")]
    ClassifierOutputMismatch { tokens: usize, labels: usize },

    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    #[error("LLM rate limited, retry after {retry_after_secs}s")]
    LlmRateLimited { retry_after_secs: u64 },

    #[error("failed to parse LLM response: {0}")]
    LlmResponseParse(String),

    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display() {
        let err = AssistantError::ClassifierOutputMismatch {
            tokens: 3,
            labels: 2,
        };
        assert_eq!(err.to_string(), "classifier returned 3 tokens but 2 labels");
    }
}
