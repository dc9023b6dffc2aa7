//! Chat completions against OpenAI or Azure OpenAI
//!
//! Azure OpenAI is used when `AZURE_OPENAI_ENDPOINT` is configured; the model
//! name is then the deployment name.

use crate::config::AppConfig;
use crate::error::{AiItError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const LLM_TIMEOUT_SECS: u64 = 120;

const GENERATION_FAILED: &str =
    "OpenAI / Azure OpenAI request failed. Check API key, endpoint, and network.";

#[derive(Debug, Clone)]
enum Backend {
    OpenAi { base_url: String },
    Azure { endpoint: String, api_version: String },
}

pub struct ChatClient {
    client: Client,
    backend: Backend,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.openai_api_key.is_empty() {
            return Err(AiItError::ConfigError(
                "OPENAI_API_KEY is missing or empty. Set it in .env (for Azure OpenAI use your Azure API key and set AZURE_OPENAI_ENDPOINT; see .env.example).".into(),
            ));
        }

        let backend = if config.azure_openai_endpoint.is_empty() {
            Backend::OpenAi {
                base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            }
        } else {
            Backend::Azure {
                endpoint: config.azure_openai_endpoint.trim_end_matches('/').to_string(),
                api_version: config.azure_openai_api_version.clone(),
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()
            .map_err(|e| AiItError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            backend,
            api_key: config.openai_api_key.clone(),
            model: config.azure_openai_deployment.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_azure(&self) -> bool {
        matches!(self.backend, Backend::Azure { .. })
    }

    /// Send a system + user message pair and return the reply text.
    ///
    /// An empty completion yields an empty string. Every failure is reported
    /// as one generation error without upstream detail.
    pub async fn generate(&self, system_prompt: &str, user_input: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_input,
                },
            ],
        };

        let request = match &self.backend {
            Backend::OpenAi { base_url } => self
                .client
                .post(format!("{}/chat/completions", base_url))
                .bearer_auth(&self.api_key),
            Backend::Azure {
                endpoint,
                api_version,
            } => self
                .client
                .post(format!(
                    "{}/openai/deployments/{}/chat/completions",
                    endpoint, self.model
                ))
                .query(&[("api-version", api_version.as_str())])
                .header("api-key", &self.api_key),
        };

        tracing::debug!(model = %self.model, azure = self.is_azure(), "chat completion request");

        let response = request.json(&body).send().await.map_err(|e| {
            tracing::debug!(error = %e, "chat completion transport failure");
            AiItError::GenerationError(GENERATION_FAILED.into())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "chat completion rejected");
            return Err(AiItError::GenerationError(GENERATION_FAILED.into()));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            tracing::debug!(error = %e, "chat completion body could not be decoded");
            AiItError::GenerationError(GENERATION_FAILED.into())
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }
}
