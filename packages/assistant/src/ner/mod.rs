mod classifier;
mod spans;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub use classifier::test_support::MockClassifier;
pub use classifier::{HttpTokenClassifier, TokenClassifier};
pub use spans::{
    build_search_query, search_terms, SpanExtractor, DEFAULT_CONTINUATION_MARKER,
    DEFAULT_SPECIAL_TOKENS,
};
pub use types::{ClassifierOutput, EntitySpan, Tag, TokenLabel};
