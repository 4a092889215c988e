//! Chat orchestration: sequences the classifier, the span extractor, the
//! case-law search and the answer model for one user query.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kanoon_client::{KanoonClient, SearchQuery};

use crate::config::{DECODE_FAILED_MESSAGE, NO_ENTITIES_MESSAGE};
use crate::error::{AssistantError, Result};
use crate::llm::{
    build_answer_prompt, build_system_prompt, LlmConfig, LlmRequest, LlmRouter, Message,
    ModelPreference, Role,
};
use crate::ner::{build_search_query, search_terms, EntitySpan, SpanExtractor, TokenClassifier};

/// Answer to one chat query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub user_query: String,
    pub extracted_legal_entities: Vec<String>,
    /// Parsed search JSON, the sentinel `{"errmsg": ...}`, or a
    /// `{"message"| "error": ...}` placeholder.
    pub indian_kanoon_results: serde_json::Value,
    /// `None` when no provider is configured or generation failed.
    pub lawyer_response: Option<String>,
    /// Provider that produced `lawyer_response`.
    pub model: Option<ModelPreference>,
}

pub struct ChatService {
    classifier: Box<dyn TokenClassifier>,
    extractor: SpanExtractor,
    search: Arc<KanoonClient>,
    llm: LlmRouter,
    temperature: f64,
    max_tokens: u32,
}

impl ChatService {
    pub fn new(
        classifier: Box<dyn TokenClassifier>,
        search: KanoonClient,
        llm: LlmRouter,
        llm_config: &LlmConfig,
    ) -> Self {
        Self {
            classifier,
            extractor: SpanExtractor::default(),
            search: Arc::new(search),
            llm,
            temperature: llm_config.temperature,
            max_tokens: llm_config.max_tokens,
        }
    }

    pub fn with_extractor(mut self, extractor: SpanExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Answer a query.
    ///
    /// Only an empty query is an error. Classifier, search and LLM failures
    /// degrade the response instead.
    pub async fn respond(&self, query: &str, model: ModelPreference) -> Result<ChatResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AssistantError::InvalidInput("query is empty".into()));
        }
        info!(query, "user query");

        let spans = self.extract_entities(query).await;
        let entities = search_terms(&spans);
        info!(?entities, "extracted entities");

        let results = if entities.is_empty() {
            info!("no relevant entities found to search Indian Kanoon");
            serde_json::json!({ "message": NO_ENTITIES_MESSAGE })
        } else {
            self.search_case_law(&build_search_query(&spans)).await
        };

        let (model, lawyer_response) = match self.answer(query, &entities, &results, model).await {
            Some((model, answer)) => (Some(model), Some(answer)),
            None => (None, None),
        };

        Ok(ChatResponse {
            user_query: query.to_string(),
            extracted_legal_entities: entities,
            indian_kanoon_results: results,
            lawyer_response,
            model,
        })
    }

    /// Classify and merge; a classifier failure yields no entities.
    pub async fn extract_entities(&self, text: &str) -> Vec<EntitySpan> {
        match self.classifier.classify(text).await {
            Ok(tokens) => self.extractor.extract(&tokens),
            Err(e) => {
                warn!(error = %e, "error extracting entities");
                Vec::new()
            }
        }
    }

    /// Run the blocking search off the async runtime and parse its JSON.
    async fn search_case_law(&self, search_query: &str) -> serde_json::Value {
        info!(search_query, "searching Indian Kanoon");

        let client = Arc::clone(&self.search);
        let query = SearchQuery::new(search_query);
        let body = match tokio::task::spawn_blocking(move || client.search(&query, 0)).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "search task failed");
                return serde_json::json!({
                    "error": format!("Error querying Indian Kanoon: {e}")
                });
            }
        };

        match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "error decoding Indian Kanoon JSON response");
                serde_json::json!({ "error": DECODE_FAILED_MESSAGE })
            }
        }
    }

    async fn answer(
        &self,
        query: &str,
        entities: &[String],
        results: &serde_json::Value,
        preference: ModelPreference,
    ) -> Option<(ModelPreference, String)> {
        let Some((model, client)) = self.llm.select(preference) else {
            warn!("no LLM provider configured, skipping answer");
            return None;
        };
        if model != preference {
            info!(%preference, %model, "preferred model not configured, using fallback");
        }

        let request = LlmRequest {
            system: build_system_prompt().to_string(),
            messages: vec![Message {
                role: Role::User,
                content: build_answer_prompt(query, entities, results),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match client.complete(&request).await {
            Ok(response) => {
                info!(
                    %model,
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "answer generated"
                );
                Some((model, response.content))
            }
            Err(e) => {
                warn!(%model, error = %e, "answer generation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kanoon_client::http::test_support::{Reply, ScriptedTransport};
    use kanoon_client::KanoonConfig;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::llm::MockLlmClient;
    use crate::ner::MockClassifier;

    const RESULTS: &str = r#"{"docs":[{"tid":257876,"title":"Kesavananda Bharati vs State Of Kerala","headline":"<b>basic structure</b>","docsource":"Supreme Court of India","publishdate":"1973-04-24"}]}"#;

    fn kanoon(transport: &Arc<ScriptedTransport>) -> KanoonClient {
        KanoonClient::with_transport(Box::new(Arc::clone(transport)), &KanoonConfig::new("t"))
            .with_sleep(|_| {})
    }

    fn entity_classifier() -> MockClassifier {
        MockClassifier::new(&[
            ("[CLS]", "O"),
            ("Is", "O"),
            ("Kesa", "B-PER"),
            ("##vananda", "I-PER"),
            ("Bharati", "I-PER"),
            ("still", "O"),
            ("good", "O"),
            ("law", "O"),
            ("in", "O"),
            ("Kerala", "B-LOC"),
            ("?", "O"),
            ("[SEP]", "O"),
        ])
    }

    fn service(
        classifier: MockClassifier,
        transport: &Arc<ScriptedTransport>,
        llm: LlmRouter,
    ) -> ChatService {
        ChatService::new(Box::new(classifier), kanoon(transport), llm, &LlmConfig::default())
    }

    #[tokio::test]
    async fn test_full_flow() {
        let transport = Arc::new(ScriptedTransport::with_body(RESULTS));
        let llm = Arc::new(MockLlmClient::with_response("Yes, it remains binding."));
        let router = LlmRouter::default()
            .with_client(ModelPreference::Mistral, Box::new(Arc::clone(&llm)));

        let chat = service(entity_classifier(), &transport, router);
        let response = chat
            .respond("Is Kesavananda Bharati still good law in Kerala?", ModelPreference::Mistral)
            .await
            .unwrap();

        assert_eq!(
            response.extracted_legal_entities,
            vec!["Kesavananda Bharati".to_string(), "Kerala".to_string()]
        );
        assert_eq!(
            transport.paths(),
            vec!["/search/?formInput=Kesavananda+Bharati+Kerala&pagenum=0&maxpages=1".to_string()]
        );
        assert_eq!(response.indian_kanoon_results["docs"][0]["tid"], 257876);
        assert_eq!(response.lawyer_response.as_deref(), Some("Yes, it remains binding."));
        assert_eq!(response.model, Some(ModelPreference::Mistral));

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[0].content.contains("Kesavananda Bharati vs State Of Kerala"));
    }

    #[tokio::test]
    async fn test_no_entities_skips_search() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let chat = service(
            MockClassifier::new(&[("what", "O"), ("is", "O"), ("bail", "O")]),
            &transport,
            LlmRouter::default(),
        );

        let response = chat.respond("what is bail", ModelPreference::Gemini).await.unwrap();

        assert!(response.extracted_legal_entities.is_empty());
        assert_eq!(
            response.indian_kanoon_results,
            serde_json::json!({ "message": NO_ENTITIES_MESSAGE })
        );
        assert_eq!(transport.attempts(), 0);
        assert_eq!(response.lawyer_response, None);
        assert_eq!(response.model, None);
    }

    #[tokio::test]
    async fn test_classifier_failure_degrades() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let chat = service(MockClassifier::failing(), &transport, LlmRouter::default());

        let response = chat.respond("anything", ModelPreference::Mistral).await.unwrap();
        assert!(response.extracted_legal_entities.is_empty());
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_search_body() {
        let transport = Arc::new(ScriptedTransport::with_body("<html>maintenance</html>"));
        let chat = service(entity_classifier(), &transport, LlmRouter::default());

        let response = chat.respond("q", ModelPreference::Mistral).await.unwrap();
        assert_eq!(
            response.indian_kanoon_results,
            serde_json::json!({ "error": DECODE_FAILED_MESSAGE })
        );
    }

    #[tokio::test]
    async fn test_exhausted_search_is_valid_result() {
        let failures = (0..10).map(|_| Reply::Fail("down".into())).collect();
        let transport = Arc::new(ScriptedTransport::new(failures));
        let llm = Arc::new(MockLlmClient::with_response("General answer."));
        let router = LlmRouter::default()
            .with_client(ModelPreference::Gemini, Box::new(Arc::clone(&llm)));

        let chat = service(entity_classifier(), &transport, router);
        let response = chat.respond("q", ModelPreference::Mistral).await.unwrap();

        assert!(response.indian_kanoon_results["errmsg"].is_string());
        assert_eq!(transport.attempts(), 10);
        // Mistral is not configured, so Gemini answers.
        assert_eq!(response.model, Some(ModelPreference::Gemini));
        assert!(llm.requests()[0].messages[0].content.contains("search failed"));
    }

    #[tokio::test]
    async fn test_llm_failure_leaves_answer_empty() {
        let transport = Arc::new(ScriptedTransport::with_body(RESULTS));
        let router = LlmRouter::default()
            .with_client(ModelPreference::Mistral, Box::new(MockLlmClient::failing()));

        let chat = service(entity_classifier(), &transport, router);
        let response = chat.respond("q", ModelPreference::Mistral).await.unwrap();

        assert_eq!(response.lawyer_response, None);
        assert_eq!(response.extracted_legal_entities.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let chat = service(entity_classifier(), &transport, LlmRouter::default());

        let result = chat.respond("   ", ModelPreference::Mistral).await;
        assert!(matches!(result, Err(AssistantError::InvalidInput(_))));
    }

    #[test]
    fn test_response_serialization_keys() {
        let response = ChatResponse {
            user_query: "q".into(),
            extracted_legal_entities: vec!["Delhi".into()],
            indian_kanoon_results: serde_json::json!({}),
            lawyer_response: None,
            model: Some(ModelPreference::Gemini),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["extracted_legal_entities"][0], "Delhi");
        assert_eq!(value["model"], "gemini");
        assert!(value["lawyer_response"].is_null());
    }
}
