use itinera::LLMClient;
use itinera::llm::OpenAISettings;
use itinera::llm::openai::OpenAIClient;
use itinera::types::AppError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> OpenAISettings {
    OpenAISettings {
        api_key: "test-key".to_string(),
        api_base: format!("{}/v1", server.uri()),
        default_model: "gpt-test".to_string(),
        temperature: 0.2,
        max_tokens: 512,
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        max_retries: 2,
        retry_backoff: Duration::from_millis(50),
        json_mode: true,
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

fn api_error(message: &str, kind: &str) -> serde_json::Value {
    json!({"error": {"message": message, "type": kind, "param": null, "code": null}})
}

#[tokio::test]
async fn test_prompt_returns_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "response_format": {"type": "json_object"},
            "max_completion_tokens": 512
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"ok": true}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::new(settings(&server)).unwrap();
    let answer = client.prompt("Plan a trip", "").await.unwrap();
    assert_eq!(answer, r#"{"ok": true}"#);
}

#[tokio::test]
async fn test_explicit_model_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-planner"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::new(settings(&server)).unwrap();
    client.prompt("Plan a trip", "gpt-planner").await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("second time lucky")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::new(settings(&server)).unwrap();
    let answer = client.prompt("Plan a trip", "").await.unwrap();
    assert_eq!(answer, "second time lucky");
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(api_error("Rate limit reached", "requests")),
        )
        .expect(2..=4)
        .mount(&server)
        .await;

    let client = OpenAIClient::new(settings(&server)).unwrap();
    let err = client.prompt("Plan a trip", "").await.unwrap_err();
    match err {
        AppError::LLM(msg) => assert!(msg.contains("Rate limit reached")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(api_error(
            "Unknown model gpt-test",
            "invalid_request_error",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::new(settings(&server)).unwrap();
    let err = client.prompt("Plan a trip", "").await.unwrap_err();
    assert!(err.to_string().contains("Unknown model gpt-test"));
}

#[tokio::test]
async fn test_missing_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-2",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-test",
            "choices": []
        })))
        .mount(&server)
        .await;

    let client = OpenAIClient::new(settings(&server)).unwrap();
    let err = client.prompt("Plan a trip", "").await.unwrap_err();
    assert!(matches!(err, AppError::LLM(msg) if msg.contains("No response")));
}

#[tokio::test]
async fn test_connection_errors_are_retried_then_reported() {
    let server = MockServer::start().await;
    let mut settings = settings(&server);
    // Nothing listens on the discard port
    settings.api_base = "http://127.0.0.1:9/v1".to_string();
    settings.max_retries = 1;
    settings.retry_backoff = Duration::from_millis(5);

    let client = OpenAIClient::new(settings).unwrap();
    let err = client.prompt("Plan a trip", "").await.unwrap_err();
    assert!(matches!(err, AppError::LLM(msg) if msg.starts_with("OpenAI API error")));
}
