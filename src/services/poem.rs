//! Poem generation and recitation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::domain::models::Poem;
use crate::domain::ports::{SpeechSynthesizer, TextGenerator};
use crate::infrastructure::llm::sanitize::parse_json_reply;

/// Signature poems recited by the townsfolk whose verses everyone knows.
/// The remaining personas get a freshly generated poem instead.
pub fn signature_poem(agent_name: &str) -> Option<&'static str> {
    match agent_name {
        "李白" => Some(
            "床前明月光，疑似地上霜。\n舉頭望明月，低頭思故鄉。",
        ),
        "李清照" => Some(
            "昨夜雨疏風驟，濃睡不消殘酒。\n試問卷簾人，卻道海棠依舊。\n知否，知否，應是綠肥紅瘦。",
        ),
        "莊子" => Some(
            "北冥有魚，其名為鯤。\n鯤之大，不知其幾千里也。\n化而為鳥，其名為鵬。\n鵬之背，不知其幾千里也；\n怒而飛，其翼若垂天之雲。",
        ),
        _ => None,
    }
}

/// Generates poems through the poem model and optionally recites them
/// through a speech synthesizer.
pub struct PoemService {
    generator: Arc<dyn TextGenerator>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    theme: String,
}

impl PoemService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        theme: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            theme: theme.into(),
        }
    }

    /// Compose a fresh poem in both scripts.
    pub async fn compose(&self) -> Result<Poem> {
        let prompt = format!(
            r#"請以「{}」為主題，創作一首優美的五言古詩，共四句。風格典雅，意境悠遠，朗朗上口。
    並且請僅輸出詩詞部分。
    輸出簡體中文與繁體中文版本，格式如下:
    {{"簡": "xxx", "繁": "xxx"}}
    "#,
            self.theme
        );
        let reply = self.generator.generate(&prompt).await?;
        let poem: Poem = parse_json_reply(&reply).context("poem reply was not the expected JSON")?;
        Ok(poem)
    }

    /// Compose a poem and synthesize the simplified rendering as audio.
    ///
    /// Synthesis is best-effort: a failed or disabled voice never loses the
    /// poem itself.
    pub async fn recite(&self, sound_label: &str) -> Result<Poem> {
        let poem = self.compose().await?;
        if let Some(synthesizer) = &self.synthesizer {
            if let Err(err) = synthesizer.synthesize(&poem.simplified, sound_label).await {
                warn!(sound_label, error = %err, "speech synthesis failed, keeping the poem");
            }
        }
        Ok(poem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn composes_from_strict_json() {
        let service = PoemService::new(
            Arc::new(CannedGenerator(
                "```json\n{\"簡\": \"静夜思\", \"繁\": \"靜夜思\"}\n```".to_string(),
            )),
            None,
            "主題",
        );
        let poem = service.compose().await.unwrap();
        assert_eq!(poem.simplified, "静夜思");
        assert_eq!(poem.traditional, "靜夜思");
    }

    #[tokio::test]
    async fn prose_apologies_are_errors() {
        let service = PoemService::new(
            Arc::new(CannedGenerator("抱歉，今天沒有靈感。".to_string())),
            None,
            "主題",
        );
        assert!(service.compose().await.is_err());
    }

    #[test]
    fn only_three_personas_have_signature_poems() {
        assert!(signature_poem("李白").is_some());
        assert!(signature_poem("李清照").is_some());
        assert!(signature_poem("莊子").is_some());
        assert!(signature_poem("李昇暾").is_none());
    }
}
