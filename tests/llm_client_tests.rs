//! Chat client against mocked OpenAI and Azure OpenAI endpoints

use ai_it::config::AppConfig;
use ai_it::error::AiItError;
use ai_it::llm::ChatClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_config(server: &MockServer) -> AppConfig {
    AppConfig {
        openai_api_key: "sk-test-key".into(),
        openai_base_url: format!("{}/v1", server.uri()),
        ..Default::default()
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test]
async fn test_openai_request_shape_and_trimmed_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "You are terse."},
                {"role": "user", "content": "Reset a BitLocker PIN"}
            ]
        })))
        .respond_with(completion("  Use manage-bde.  \n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(&openai_config(&server)).unwrap();
    let reply = client
        .generate("You are terse.", "Reset a BitLocker PIN")
        .await
        .unwrap();

    assert_eq!(reply, "Use manage-bde.");
}

#[tokio::test]
async fn test_azure_request_uses_deployment_and_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/it-gpt/chat/completions"))
        .and(query_param("api-version", "2024-02-15-preview"))
        .and(header("api-key", "azure-key"))
        .respond_with(completion("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig {
        openai_api_key: "azure-key".into(),
        azure_openai_endpoint: format!("{}/", server.uri()),
        azure_openai_deployment: "it-gpt".into(),
        ..Default::default()
    };
    let client = ChatClient::new(&config).unwrap();

    assert!(client.is_azure());
    assert_eq!(client.generate("sys", "user").await.unwrap(), "ok");
}

#[tokio::test]
async fn test_missing_choices_or_content_is_empty_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let client = ChatClient::new(&openai_config(&server)).unwrap();
    assert_eq!(client.generate("sys", "user").await.unwrap(), "");
    assert_eq!(client.generate("sys", "user").await.unwrap(), "");
}

#[tokio::test]
async fn test_upstream_failure_is_generation_error_without_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Incorrect API key provided: sk-test-key"}})),
        )
        .mount(&server)
        .await;

    let client = ChatClient::new(&openai_config(&server)).unwrap();
    let err = client.generate("sys", "user").await.unwrap_err();

    assert!(matches!(err, AiItError::GenerationError(_)));
    assert!(!err.to_string().contains("sk-test-key"));
}

#[tokio::test]
async fn test_undecodable_body_is_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = ChatClient::new(&openai_config(&server)).unwrap();
    let err = client.generate("sys", "user").await.unwrap_err();
    assert!(matches!(err, AiItError::GenerationError(_)));
}
