//! Cleanup of model replies before parsing.
//!
//! Models wrap JSON in Markdown fences and sprinkle BOM/NBSP noise no
//! matter how sternly the prompt forbids it.

use serde::de::DeserializeOwned;

use crate::domain::errors::{DomainError, DomainResult};

/// Strip Markdown code fences, BOM and non-breaking spaces from a reply.
pub fn clean_reply(raw: &str) -> String {
    let mut text = raw.trim().trim_start_matches('\u{FEFF}').trim_start();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().replace('\u{00A0}', " ").trim().to_string()
}

/// Clean a reply and parse it as JSON into `T`.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> DomainResult<T> {
    let cleaned = clean_reply(raw);
    serde_json::from_str(&cleaned).map_err(|err| {
        let preview: String = cleaned.chars().take(200).collect();
        DomainError::MalformedModelReply(format!("{err} (reply started: {preview:?})"))
    })
}
