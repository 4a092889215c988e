//! Tests of the HTTPS transport and retry loop against a mock API server.
//!
//! The client is blocking, so each test drives it from the blocking pool
//! while the mock server runs on the async runtime.

use std::time::Duration;

use kanoon_client::{KanoonClient, KanoonConfig, RetryPolicy, SearchQuery};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search_response() -> serde_json::Value {
    serde_json::json!({
        "found": "1 - 1 of 1",
        "docs": [
            {
                "tid": 1199182,
                "title": "Justice K.S.Puttaswamy (Retd) vs Union Of India",
                "headline": "the <b>right to privacy</b> is protected",
                "docsource": "Supreme Court of India",
                "publishdate": "2017-08-24"
            }
        ]
    })
}

/// Build the client inside the blocking pool; a blocking reqwest client
/// must not be created or dropped on the async runtime.
fn client_for(config: &KanoonConfig) -> KanoonClient {
    KanoonClient::new(config)
        .expect("client creation")
        .with_sleep(|_| {})
}

fn config_for(server: &MockServer) -> KanoonConfig {
    KanoonConfig::new("test-token").with_base_url(server.uri())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_sends_auth_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/"))
        .and(query_param("formInput", "right to privacy"))
        .and(query_param("pagenum", "0"))
        .and(query_param("maxpages", "1"))
        .and(header("authorization", "Token test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server);
    let body = tokio::task::spawn_blocking(move || {
        client_for(&config).search(&SearchQuery::new("right to privacy"), 0)
    })
    .await
    .expect("join");

    let parsed: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(parsed, search_response());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_edge_error_page_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/doc/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("error code: 503"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/doc/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"tid": 42}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server);
    let body = tokio::task::spawn_blocking(move || client_for(&config).fetch_doc(42))
        .await
        .expect("join");

    assert_eq!(body, r#"{"tid": 42}"#);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_utf8_body_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/doc/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFE, b'{']))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/doc/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"tid": 1}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server);
    let body = tokio::task::spawn_blocking(move || client_for(&config).fetch_doc(1))
        .await
        .expect("join");

    assert_eq!(body, r#"{"tid": 1}"#);
    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_is_not_a_failure_signal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/docmeta/7/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"errmsg": "Invalid token"}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server);
    let body = tokio::task::spawn_blocking(move || client_for(&config).fetch_doc_meta(7))
        .await
        .expect("join");

    assert_eq!(body, r#"{"errmsg": "Invalid token"}"#);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_host_degrades_to_sentinel() {
    // Nothing listens on port 9 (discard) on test machines.
    let config = KanoonConfig::new("t")
        .with_base_url("http://127.0.0.1:9")
        .with_timeout_secs(2);

    let body = tokio::task::spawn_blocking(move || {
        let client = KanoonClient::new(&config)
            .expect("client creation")
            .with_policy(RetryPolicy {
                max_attempts: 2,
                step: Duration::from_millis(1),
            });
        client.fetch_orig_doc(1)
    })
    .await
    .expect("join");

    let parsed: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert!(parsed["errmsg"].is_string());
}
