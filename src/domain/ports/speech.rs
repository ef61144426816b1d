//! Speech synthesis port.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

/// Turns text into an audio clip stored on disk.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and store it under `sound_label`.
    ///
    /// Returns the path of the written clip.
    async fn synthesize(&self, text: &str, sound_label: &str) -> Result<PathBuf>;
}
