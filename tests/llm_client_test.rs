//! Provider adapter tests against a mocked HTTP server.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yunmeng::domain::models::{DeepSeekConfig, GeminiConfig};
use yunmeng::infrastructure::llm::{DeepSeekClient, GeminiClient, RetryPolicy};
use yunmeng::TextGenerator;

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, 1, 5)
}

fn gemini_config(server: &MockServer) -> GeminiConfig {
    GeminiConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        ..GeminiConfig::default()
    }
}

fn deepseek_config(server: &MockServer) -> DeepSeekConfig {
    DeepSeekConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        ..DeepSeekConfig::default()
    }
}

#[tokio::test]
async fn gemini_concatenates_candidate_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash-latest:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "床前"}, {"text": "明月光"}]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(gemini_config(&server), fast_retry(1)).unwrap();
    let reply = client.generate("請作詩").await.unwrap();
    assert_eq!(reply, "床前明月光");
}

#[tokio::test]
async fn gemini_auth_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(gemini_config(&server), fast_retry(3)).unwrap();
    assert!(client.generate("請作詩").await.is_err());
}

#[tokio::test]
async fn gemini_server_errors_are_retried_then_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let client = GeminiClient::new(gemini_config(&server), fast_retry(2)).unwrap();
    assert!(client.generate("請作詩").await.is_err());
}

#[tokio::test]
async fn gemini_empty_candidates_are_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let client = GeminiClient::new(gemini_config(&server), fast_retry(1)).unwrap();
    assert!(client.generate("請作詩").await.is_err());
}

#[tokio::test]
async fn a_padded_api_key_fails_fast_at_construction() {
    let config = GeminiConfig {
        api_key: Some(" padded-key ".to_string()),
        ..GeminiConfig::default()
    };
    assert!(GeminiClient::new(config, fast_retry(1)).is_err());
}

#[tokio::test]
async fn deepseek_returns_the_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "古城朝霧散"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeepSeekClient::new(deepseek_config(&server), fast_retry(1)).unwrap();
    let reply = client.generate("請作詩").await.unwrap();
    assert_eq!(reply, "古城朝霧散");
}

#[tokio::test]
async fn deepseek_without_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = DeepSeekClient::new(deepseek_config(&server), fast_retry(1)).unwrap();
    assert!(client.generate("請作詩").await.is_err());
}
