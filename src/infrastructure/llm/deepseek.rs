//! DeepSeek adapter for the text generation port.
//!
//! DeepSeek exposes an OpenAI-compatible `chat/completions` endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::models::DeepSeekConfig;
use crate::domain::ports::TextGenerator;

use super::error::LlmApiError;
use super::retry::RetryPolicy;
use super::validated_api_key;

/// HTTP client for the DeepSeek chat completions API.
pub struct DeepSeekClient {
    http_client: ReqwestClient,
    config: DeepSeekConfig,
    api_key: String,
    retry_policy: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl DeepSeekClient {
    /// Build a client, resolving and validating the API key up front.
    pub fn new(config: DeepSeekConfig, retry_policy: RetryPolicy) -> Result<Self> {
        let api_key =
            validated_api_key("deepseek", config.api_key.as_deref(), "DEEPSEEK_API_KEY")?;
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for DeepSeek")?;

        Ok(Self {
            http_client,
            config,
            api_key,
            retry_policy,
        })
    }

    async fn send_request(&self, prompt: &str) -> Result<String, LlmApiError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            stream: false,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(LlmApiError::from_status(status, body));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmApiError::EmptyReply);
        }
        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for DeepSeekClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.retry_policy
            .execute(|| self.send_request(prompt))
            .await
            .context("DeepSeek request failed")
    }
}
