//! Kanoon Assistant - legal questions answered from Indian case law.
//!
//! A query flows through four stages: a token classifier tags it with
//! BIO labels, [`SpanExtractor`] merges the tags into entity spans, the
//! spans drive an Indian Kanoon search, and a chat model writes an
//! answer grounded in the returned cases.
//!
//! # Example
//!
//! ```
//! use kanoon_assistant::{SpanExtractor, TokenLabel};
//!
//! let tokens = vec![
//!     TokenLabel::new("[CLS]", "O"),
//!     TokenLabel::new("New", "B-LOC"),
//!     TokenLabel::new("Delhi", "I-LOC"),
//!     TokenLabel::new("[SEP]", "O"),
//! ];
//! let spans = SpanExtractor::new().extract(&tokens);
//! assert_eq!(spans[0].text, "New Delhi");
//! assert_eq!(spans[0].label, "LOC");
//! ```
//!
//! # Architecture
//!
//! - [`ner`]: Token classifier seam and BIO span merging
//! - [`llm`]: Mistral and Gemini clients, provider routing and prompts
//! - [`chat`]: Orchestration of one chat query
//! - [`config`]: Environment configuration
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod ner;

pub use chat::{ChatResponse, ChatService};
pub use config::{AssistantConfig, NerConfig};
pub use error::{AssistantError, Result};
pub use llm::ModelPreference;
pub use ner::{EntitySpan, SpanExtractor, TokenLabel};
