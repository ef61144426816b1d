//! Gemini REST adapter for the text generation port.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::models::GeminiConfig;
use crate::domain::ports::TextGenerator;

use super::error::LlmApiError;
use super::retry::RetryPolicy;
use super::validated_api_key;

/// HTTP client for the Gemini `generateContent` endpoint.
///
/// Connection pooling comes from the shared `reqwest::Client`; transient
/// failures are retried with exponential backoff.
pub struct GeminiClient {
    http_client: ReqwestClient,
    config: GeminiConfig,
    api_key: String,
    retry_policy: RetryPolicy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    safety_settings: Vec<SafetySetting>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn default_safety_settings() -> Vec<SafetySetting> {
    const THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting { category, threshold: THRESHOLD })
    .collect()
}

impl GeminiClient {
    /// Build a client, resolving and validating the API key up front.
    pub fn new(config: GeminiConfig, retry_policy: RetryPolicy) -> Result<Self> {
        let api_key = validated_api_key("gemini", config.api_key.as_deref(), "GEMINI_API_KEY")?;
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for Gemini")?;

        Ok(Self {
            http_client,
            config,
            api_key,
            retry_policy,
        })
    }

    async fn send_request(&self, prompt: &str) -> Result<String, LlmApiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let request = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            safety_settings: default_safety_settings(),
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
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

        let parsed: GenerateContentResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmApiError::EmptyReply);
        }
        debug!(model = %self.config.model, chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.retry_policy
            .execute(|| self.send_request(prompt))
            .await
            .context("Gemini request failed")
    }
}
