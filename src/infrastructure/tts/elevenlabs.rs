//! ElevenLabs text-to-speech adapter.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use tracing::info;

use crate::domain::models::TtsConfig;
use crate::domain::ports::SpeechSynthesizer;
use crate::infrastructure::llm::LlmApiError;

/// Synthesizes speech through the ElevenLabs API and writes MP3 clips
/// under the configured audio directory.
pub struct ElevenLabsSynthesizer {
    http_client: ReqwestClient,
    config: TtsConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: TtsConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
            .context("ElevenLabs API key not configured; set ELEVENLABS_API_KEY")?;
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for ElevenLabs")?;

        Ok(Self { http_client, config, api_key })
    }

    /// Clip file name for a sound label. Colons come from clock labels and
    /// are not welcome in file names.
    fn clip_path(&self, sound_label: &str) -> PathBuf {
        let file_name = format!("{}.mp3", sound_label.replace(':', ""));
        PathBuf::from(&self.config.audio_dir).join(file_name)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, sound_label: &str) -> Result<PathBuf> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url, self.config.voice_id
        );
        let request = SynthesisRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send ElevenLabs request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(LlmApiError::from_status(status, body)).context("ElevenLabs synthesis failed");
        }

        let audio = response
            .bytes()
            .await
            .context("Failed to read ElevenLabs audio body")?;

        let path = self.clip_path(sound_label);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create audio dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &audio)
            .await
            .with_context(|| format!("Failed to write clip {}", path.display()))?;

        info!(clip = %path.display(), bytes = audio.len(), "synthesized speech clip");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_names_strip_colons() {
        let config = TtsConfig {
            api_key: Some("k".to_string()),
            audio_dir: "assets/audio".to_string(),
            ..TtsConfig::default()
        };
        let synth = ElevenLabsSynthesizer::new(config).unwrap();
        let path = synth.clip_path("李白_08:00");
        assert_eq!(path, PathBuf::from("assets/audio/李白_0800.mp3"));
    }
}
