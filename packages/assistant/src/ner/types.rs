use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, Result};

/// One subword token and the BIO tag the classifier gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLabel {
    pub token: String,
    pub tag: String,
}

impl TokenLabel {
    pub fn new(token: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            tag: tag.into(),
        }
    }

    /// Pair up the parallel token and label arrays a classifier produces.
    pub fn zip(tokens: Vec<String>, labels: Vec<String>) -> Result<Vec<Self>> {
        if tokens.len() != labels.len() {
            return Err(AssistantError::ClassifierOutputMismatch {
                tokens: tokens.len(),
                labels: labels.len(),
            });
        }

        Ok(tokens
            .into_iter()
            .zip(labels)
            .map(|(token, tag)| Self { token, tag })
            .collect())
    }
}

/// A reconstructed entity. `label` is the entity type, never `O`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Parsed view of a BIO tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag<'a> {
    Begin(&'a str),
    Inside(&'a str),
    Outside,
}

impl<'a> Tag<'a> {
    /// Parse a tag string.
    ///
    /// Anything other than `B-<TYPE>` or `I-<TYPE>` is `Outside`, and so is
    /// a prefixed tag whose type is empty or `O`.
    pub fn parse(tag: &'a str) -> Self {
        match tag.split_once('-') {
            Some(("B", t)) if is_entity_type(t) => Tag::Begin(t),
            Some(("I", t)) if is_entity_type(t) => Tag::Inside(t),
            _ => Tag::Outside,
        }
    }
}

fn is_entity_type(t: &str) -> bool {
    !t.is_empty() && t != "O"
}

/// Output format of a token-classification model: parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub tokens: Vec<String>,
    pub labels: Vec<String>,
}

impl ClassifierOutput {
    pub fn into_token_labels(self) -> Result<Vec<TokenLabel>> {
        TokenLabel::zip(self.tokens, self.labels)
    }
}
