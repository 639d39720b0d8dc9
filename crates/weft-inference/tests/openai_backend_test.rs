//! Integration tests for the OpenAI-compatible backend.
//!
//! Verifies the request shape, bearer auth, reply extraction, and error
//! classification against a mock HTTP server.

use weft_core::GenerationBackend;
use weft_inference::OpenAiBackend;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            {
                "message": {
                    "role": "assistant",
                    "content": content
                }
            }
        ]
    })
}

#[tokio::test]
async fn test_generate_returns_message_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("[]")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAiBackend::with_config(
        format!("{}/v1/chat/completions", mock_server.uri()),
        "test-model".to_string(),
        Some("test-key".to_string()),
        30,
    );

    let reply = backend.generate("score these notes").await.unwrap();
    assert_eq!(reply, "[]");
    assert_eq!(backend.model_name(), "test-model");
}

#[tokio::test]
async fn test_bearer_key_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAiBackend::with_config(
        format!("{}/v1/chat/completions", mock_server.uri()),
        "test-model".to_string(),
        Some("secret-key".to_string()),
        30,
    );

    backend.generate("prompt").await.unwrap();
}

#[tokio::test]
async fn test_reasoning_content_fallback() {
    let mock_server = MockServer::start().await;

    let reply = serde_json::json!({
        "choices": [
            {
                "message": {
                    "role": "assistant",
                    "content": "",
                    "reasoning_content": "[{\"id\": \"x\"}]"
                }
            }
        ]
    });

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&mock_server)
        .await;

    let backend = OpenAiBackend::with_config(
        format!("{}/v1/chat/completions", mock_server.uri()),
        "test-model".to_string(),
        None,
        30,
    );

    let content = backend.generate("prompt").await.unwrap();
    assert_eq!(content, "[{\"id\": \"x\"}]");
}

#[tokio::test]
async fn test_server_error_is_not_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let backend = OpenAiBackend::with_config(
        format!("{}/v1/chat/completions", mock_server.uri()),
        "test-model".to_string(),
        None,
        30,
    );

    let err = backend.generate("prompt").await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_health_check_reports_availability() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Hi")))
        .mount(&mock_server)
        .await;

    let backend = OpenAiBackend::with_config(
        format!("{}/v1/chat/completions", mock_server.uri()),
        "test-model".to_string(),
        None,
        30,
    );

    assert!(backend.health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_false_when_unreachable() {
    // Port 1 is never listening.
    let backend = OpenAiBackend::with_config(
        "http://127.0.0.1:1/v1/chat/completions".to_string(),
        "test-model".to_string(),
        None,
        1,
    );

    assert!(!backend.health_check().await.unwrap());
}
