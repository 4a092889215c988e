//! Reconstruct entity spans from subword tokens and their BIO tags.

use crate::ner::types::{EntitySpan, Tag, TokenLabel};

/// Subword continuation marker of WordPiece tokenizers.
pub const DEFAULT_CONTINUATION_MARKER: &str = "##";

/// Structural tokens of BERT-style tokenizers.
pub const DEFAULT_SPECIAL_TOKENS: [&str; 3] = ["[CLS]", "[SEP]", "[PAD]"];

/// Merges a tagged token sequence into entity spans in one forward pass.
#[derive(Debug, Clone)]
pub struct SpanExtractor {
    continuation_marker: String,
    special_tokens: Vec<String>,
}

impl Default for SpanExtractor {
    fn default() -> Self {
        Self {
            continuation_marker: DEFAULT_CONTINUATION_MARKER.to_string(),
            special_tokens: DEFAULT_SPECIAL_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl SpanExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_continuation_marker(mut self, marker: impl Into<String>) -> Self {
        self.continuation_marker = marker.into();
        self
    }

    pub fn with_special_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.special_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Extract spans in input order.
    ///
    /// A `B-` tag closes any open span and opens a new one. An `I-` tag of
    /// the open type extends it: directly for a continuation fragment,
    /// after one space otherwise. Anything else, including an `I-` tag of a
    /// different type or with nothing open, closes the open span.
    ///
    /// # Examples
    /// ```
    /// use kanoon_assistant::ner::{EntitySpan, SpanExtractor, TokenLabel};
    ///
    /// let tokens = vec![
    ///     TokenLabel::new("John", "B-PER"),
    ///     TokenLabel::new("##son", "I-PER"),
    /// ];
    /// assert_eq!(
    ///     SpanExtractor::new().extract(&tokens),
    ///     vec![EntitySpan::new("Johnson", "PER")]
    /// );
    /// ```
    pub fn extract(&self, tokens: &[TokenLabel]) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut current_text = String::new();
        let mut current_label: Option<&str> = None;

        for TokenLabel { token, tag } in tokens {
            if self.is_special(token) {
                continue;
            }

            match Tag::parse(tag) {
                Tag::Begin(entity_type) => {
                    flush(&mut spans, &mut current_text, current_label);
                    current_text.push_str(self.strip_marker(token));
                    current_label = Some(entity_type);
                }
                Tag::Inside(entity_type) if current_label == Some(entity_type) => {
                    match token.strip_prefix(self.continuation_marker.as_str()) {
                        Some(fragment) if !self.continuation_marker.is_empty() => {
                            current_text.push_str(fragment);
                        }
                        _ => {
                            current_text.push(' ');
                            current_text.push_str(token);
                        }
                    }
                }
                _ => {
                    flush(&mut spans, &mut current_text, current_label);
                    current_label = None;
                }
            }
        }

        flush(&mut spans, &mut current_text, current_label);
        spans
    }

    fn is_special(&self, token: &str) -> bool {
        self.special_tokens.iter().any(|t| t == token)
    }

    fn strip_marker<'t>(&self, token: &'t str) -> &'t str {
        if self.continuation_marker.is_empty() {
            return token;
        }
        token
            .strip_prefix(self.continuation_marker.as_str())
            .unwrap_or(token)
    }
}

/// Emit the open span, if any, and clear the buffer.
fn flush(spans: &mut Vec<EntitySpan>, text: &mut String, label: Option<&str>) {
    if let Some(label) = label {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            spans.push(EntitySpan::new(trimmed, label));
        }
    }
    text.clear();
}

/// Texts of the spans that carry an entity label.
pub fn search_terms(spans: &[EntitySpan]) -> Vec<String> {
    spans
        .iter()
        .filter(|s| s.label != "O")
        .map(|s| s.text.clone())
        .collect()
}

/// Join entity texts into a single search string.
///
/// # Examples
/// ```
/// use kanoon_assistant::ner::{build_search_query, EntitySpan};
///
/// let spans = vec![EntitySpan::new("Supreme Court", "ORG"), EntitySpan::new("Delhi", "LOC")];
/// assert_eq!(build_search_query(&spans), "Supreme Court Delhi");
/// ```
pub fn build_search_query(spans: &[EntitySpan]) -> String {
    search_terms(spans).join(" ")
}
