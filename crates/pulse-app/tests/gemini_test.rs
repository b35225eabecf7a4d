//! Gemini provider against a local mock of the `generateContent` endpoint.

use pulse_app::GeminiProvider;
use pulse_core::{ContentError, ContentProvider, ContentRequest, MoodRegistry};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path, query_param},
};

const MODEL: &str = "gemini-test";

fn provider_for(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new("test-key")
        .with_model(MODEL)
        .with_base_url(format!("{}/models", server.uri()))
}

fn reply_request() -> ContentRequest {
    ContentRequest::reply(MoodRegistry::campus().default_signal(), "rough day")
}

#[tokio::test]
async fn reply_text_comes_from_first_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{MODEL}:generateContent")))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({ "contents": [{ "role": "user" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "same, hang in there" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert_eq!(provider.model(), MODEL);

    let text = provider.generate(&reply_request()).await.unwrap();
    assert_eq!(text, "same, hang in there");
}

#[tokio::test]
async fn quota_error_is_transient_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate(&reply_request()).await.unwrap_err();
    assert_eq!(err, ContentError::Http {
        status: 429,
        message: "RESOURCE_EXHAUSTED: quota exceeded".into()
    });
    assert!(err.is_transient());
}

#[tokio::test]
async fn empty_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate(&reply_request()).await.unwrap_err();
    assert_eq!(err, ContentError::EmptyResponse);
}
