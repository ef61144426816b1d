//! Shared test helpers.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use yunmeng::TextGenerator;

/// A generator that picks its reply by substring-matching the prompt.
///
/// Rules are checked in order; the first needle found in the prompt wins.
pub struct ScriptedGenerator {
    rules: Vec<(String, String)>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        for (needle, reply) in &self.rules {
            if prompt.contains(needle) {
                return Ok(reply.clone());
            }
        }
        let preview: String = prompt.chars().take(80).collect();
        Err(anyhow!("no scripted reply for prompt starting: {preview:?}"))
    }
}

/// A day-plan reply covering the morning, as the planning prompt asks.
#[allow(dead_code)]
pub fn canned_day_plan() -> String {
    serde_json::json!([
        {"time_str": "卯時初刻", "location": "河邊", "action": "起床、整理儀容", "thought": "（一日之計在於晨。）", "dialogue": ""},
        {"time_str": "辰時三刻", "location": "書院", "action": "讀書", "thought": "（今天一定要把這本書看完。）", "dialogue": ""},
        {"time_str": "戌時初刻", "location": "河邊", "action": "準備就寢", "thought": "（早些歇息。）", "dialogue": ""}
    ])
    .to_string()
}

/// A quarter-schedule reply with two slots.
#[allow(dead_code)]
pub fn canned_quarter_plan() -> String {
    serde_json::json!({
        "08:00": {"time": "08:00", "location": "書院", "action": "讀書", "thought": "（專心。）", "dialogue": ""},
        "08:15": {"time": "08:15", "location": "書院", "action": "抄寫筆記", "thought": "", "dialogue": ""}
    })
    .to_string()
}
