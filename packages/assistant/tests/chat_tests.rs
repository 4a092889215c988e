//! End-to-end chat flow against mock classifier, search and model servers.
//!
//! The search client is blocking, so these tests own their runtime and keep
//! client construction and drop outside of it.

use kanoon_assistant::config::NerConfig;
use kanoon_assistant::llm::{LlmConfig, LlmRouter, ProviderConfig};
use kanoon_assistant::ner::HttpTokenClassifier;
use kanoon_assistant::{ChatService, ModelPreference};
use kanoon_client::{KanoonClient, KanoonConfig};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn classifier_output() -> serde_json::Value {
    let raw = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/classifier_output.json"
    ))
    .expect("fixture");
    serde_json::from_str(&raw).expect("fixture json")
}

fn search_response() -> serde_json::Value {
    serde_json::json!({
        "docs": [
            {
                "tid": 1712542,
                "title": "Infosys Ltd vs Union Of India",
                "headline": "writ petition under <b>Article 226</b>",
                "docsource": "Delhi High Court",
                "publishdate": "2015-03-10"
            }
        ]
    })
}

struct Servers {
    classifier: MockServer,
    kanoon: MockServer,
    mistral: MockServer,
}

fn service(servers: &Servers) -> ChatService {
    let ner = NerConfig::default().with_endpoint(format!("{}/classify", servers.classifier.uri()));
    let classifier = HttpTokenClassifier::new(&ner).expect("classifier");

    let kanoon_config = KanoonConfig::new("kanoon-token").with_base_url(servers.kanoon.uri());
    let kanoon = KanoonClient::new(&kanoon_config)
        .expect("kanoon client")
        .with_sleep(|_| {});

    let mistral = ProviderConfig::mistral("mistral-key").with_api_base_url(servers.mistral.uri());
    let llm = LlmConfig::default().with_mistral(mistral);
    let router = LlmRouter::from_config(&llm).expect("router");

    ChatService::new(Box::new(classifier), kanoon, router, &llm)
}

#[test]
fn test_chat_end_to_end() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");

    let servers = runtime.block_on(async {
        let servers = Servers {
            classifier: MockServer::start().await,
            kanoon: MockServer::start().await,
            mistral: MockServer::start().await,
        };

        Mock::given(method("POST"))
            .and(path("/classify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(classifier_output()))
            .expect(1)
            .mount(&servers.classifier)
            .await;

        Mock::given(method("POST"))
            .and(path("/search/"))
            .and(query_param("formInput", "Delhi High Court Infosys"))
            .and(header("authorization", "Token kanoon-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_response()))
            .expect(1)
            .mount(&servers.kanoon)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("Infosys Ltd vs Union Of India"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Yes, under Article 226."}}]
            })))
            .expect(1)
            .mount(&servers.mistral)
            .await;

        servers
    });

    let chat = service(&servers);
    let response = runtime
        .block_on(chat.respond(
            "Can the Delhi High Court hear a writ against Infosys?",
            ModelPreference::Mistral,
        ))
        .expect("response");
    drop(chat);

    assert_eq!(
        response.extracted_legal_entities,
        vec!["Delhi High Court".to_string(), "Infosys".to_string()]
    );
    assert_eq!(response.indian_kanoon_results, search_response());
    assert_eq!(response.lawyer_response.as_deref(), Some("Yes, under Article 226."));
    assert_eq!(response.model, Some(ModelPreference::Mistral));

    runtime.block_on(async {
        servers.classifier.verify().await;
        servers.kanoon.verify().await;
        servers.mistral.verify().await;
    });
}

#[test]
fn test_chat_survives_classifier_outage() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");

    let servers = runtime.block_on(async {
        let servers = Servers {
            classifier: MockServer::start().await,
            kanoon: MockServer::start().await,
            mistral: MockServer::start().await,
        };

        Mock::given(method("POST"))
            .and(path("/classify"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&servers.classifier)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&servers.kanoon)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Generally, yes."}}]
            })))
            .mount(&servers.mistral)
            .await;

        servers
    });

    let chat = service(&servers);
    let response = runtime
        .block_on(chat.respond("Can I appeal?", ModelPreference::Gemini))
        .expect("response");
    drop(chat);

    assert!(response.extracted_legal_entities.is_empty());
    assert_eq!(
        response.indian_kanoon_results["message"],
        "No relevant entities found to search Indian Kanoon."
    );
    // Gemini is not configured, so Mistral answers.
    assert_eq!(response.model, Some(ModelPreference::Mistral));

    runtime.block_on(servers.kanoon.verify());
}
