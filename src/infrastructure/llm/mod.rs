//! Language model provider adapters.

pub mod deepseek;
pub mod error;
pub mod gemini;
pub mod retry;
pub mod sanitize;

pub use deepseek::DeepSeekClient;
pub use error::LlmApiError;
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;

/// Resolve an API key from config or environment and validate it.
///
/// A key must be non-empty and carry no surrounding whitespace: a trailing
/// newline from a copy-pasted `.env` line fails auth with an opaque provider
/// error otherwise.
pub(crate) fn validated_api_key(
    provider: &str,
    configured: Option<&str>,
    env_var: &str,
) -> Result<String, LlmApiError> {
    let key = configured
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .ok_or_else(|| {
            LlmApiError::AuthenticationFailed(format!(
                "{provider} API key not configured; set {env_var}"
            ))
        })?;
    if key.is_empty() || key != key.trim() {
        return Err(LlmApiError::AuthenticationFailed(format!(
            "{provider} API key is empty or has surrounding whitespace"
        )));
    }
    Ok(key)
}
