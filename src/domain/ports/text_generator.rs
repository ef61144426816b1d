//! Text generation port.
//!
//! One prompt in, one reply out. Providers differ in wire format, retries
//! and auth; none of that leaks past this trait.

use anyhow::Result;
use async_trait::async_trait;

/// A language model that turns a prompt into a text reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for the prompt.
    ///
    /// Implementations retry transient provider failures themselves; an
    /// error here means the reply is not coming.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
