use std::sync::LazyLock;

use regex::Regex;

use kanoon_client::SearchResults;

/// Number of search hits quoted to the model.
pub const MAX_CONTEXT_HITS: usize = 5;

const SYSTEM_PROMPT: &str = "You are an experienced Indian lawyer answering questions from \
members of the public. Base your answer on Indian law and on the case law provided, cite the \
cases you rely on by title, and say plainly when the material provided does not settle the \
question. Write in clear, plain English. End with a short note that this is general \
information and not legal advice.";

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// System prompt for answer generation.
pub fn build_system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Remove the highlight markup search headlines carry and collapse
/// whitespace.
pub fn strip_tags(html: &str) -> String {
    TAG_PATTERN
        .replace_all(html, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the user prompt from the query, the extracted entities and the
/// search results as returned by the search step.
pub fn build_answer_prompt(
    query: &str,
    entities: &[String],
    results: &serde_json::Value,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Question\n\n{}\n\n", query.trim()));

    if !entities.is_empty() {
        prompt.push_str("# Key terms identified\n\n");
        for entity in entities {
            prompt.push_str(&format!("- {entity}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str("# Relevant case law from Indian Kanoon\n\n");
    match SearchResults::from_value(results) {
        Some(parsed) if parsed.is_error() => {
            prompt.push_str("The case law search failed; answer from general principles.\n\n");
        }
        Some(parsed) if !parsed.docs.is_empty() => {
            for (i, hit) in parsed.docs.iter().take(MAX_CONTEXT_HITS).enumerate() {
                prompt.push_str(&format!("## {}. {}\n", i + 1, strip_tags(&hit.title)));
                if !hit.docsource.is_empty() {
                    prompt.push_str(&format!("- Court: {}\n", hit.docsource));
                }
                if !hit.publishdate.is_empty() {
                    prompt.push_str(&format!("- Date: {}\n", hit.publishdate));
                }
                if !hit.headline.is_empty() {
                    prompt.push_str(&format!("- Excerpt: {}\n", strip_tags(&hit.headline)));
                }
                prompt.push('\n');
            }
        }
        _ => {
            prompt.push_str("No matching case law was found.\n\n");
        }
    }

    prompt.push_str("Answer the question above.");
    prompt
}
