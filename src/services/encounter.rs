//! Chance encounters and meeting dialogue.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

use crate::domain::models::sim_time::normalize_clock_label;
use crate::domain::models::TownEvent;
use crate::domain::ports::TextGenerator;
use crate::infrastructure::llm::sanitize::parse_json_reply;

/// One side of a generated conversation, extracted from simulation state.
#[derive(Debug, Clone)]
pub struct SpeakerProfile {
    pub agent_id: String,
    pub name: String,
    pub persona_summary: String,
    /// What the speaker had planned before the meeting displaced it.
    pub original_action: String,
    pub recent_memories: String,
}

/// Generates random town events and two-party dialogue.
pub struct EncounterService {
    generator: Arc<dyn TextGenerator>,
    agent_names: Vec<String>,
    locations: Vec<String>,
}

impl EncounterService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        agent_names: Vec<String>,
        locations: Vec<String>,
    ) -> Self {
        Self { generator, agent_names, locations }
    }

    /// Dream up one chance encounter at a random time and place.
    pub async fn random_encounter(&self) -> Result<TownEvent> {
        let (hour, minute, pair, place) = {
            let mut rng = rand::thread_rng();
            let hour = rng.gen_range(0..24u32);
            let minute = rng.gen_range(0..4u32) * 15;
            let pair: Vec<String> = self
                .agent_names
                .choose_multiple(&mut rng, 2)
                .cloned()
                .collect();
            let place = self
                .locations
                .choose(&mut rng)
                .cloned()
                .ok_or_else(|| anyhow!("no locations configured"))?;
            (hour, minute, pair, place)
        };
        if pair.len() < 2 {
            return Err(anyhow!("need at least two agents for an encounter"));
        }

        let time_label = format!("{hour:02}:{minute:02}");
        let prompt = format!(
            r#"
    在{time_label}時，{a}與{b}在{place}相遇。請為他們的相遇構想一個簡單的事件描述。
    并且你的回應格式如下：
    時間：{time_label}
    地點：{place}
    人物：{a},{b}
    事件：（你的回復，簡單的事件描述）"#,
            a = pair[0],
            b = pair[1],
        );

        let reply = self.generator.generate(&prompt).await?;
        parse_event_reply(&reply).context("encounter reply was not in the labeled format")
    }

    /// Generate a two-turn conversation between two townsfolk who ran into
    /// each other. Speaker order is shuffled; the returned pair keeps the
    /// argument order.
    pub async fn meeting_dialogue(
        &self,
        a: &SpeakerProfile,
        b: &SpeakerProfile,
        location: &str,
        time_label: &str,
    ) -> Result<(String, String)> {
        let a_speaks_first = rand::thread_rng().gen_bool(0.5);
        let (first, second) = if a_speaks_first { (a, b) } else { (b, a) };

        let prompt = format!(
            r#"
場景：在古代中國的「{location}」，時間是「{time_label}」。
人物A：{first_name} (ID: {first_id})。人設：{first_persona}。他本來計劃做的事情是：『{first_action}』。他最近的記憶片段：『{first_memories}』。
人物B：{second_name} (ID: {second_id})。人設：{second_persona}。他本來計劃做的事情是：『{second_action}』。他最近的記憶片段：『{second_memories}』。

他們偶然相遇了。請生成一段他們之間簡短、自然、符合人設的兩輪對話。
{first_name} 先開口說一句話。
然後 {second_name} 回應一句話。

請嚴格以 JSON 物件格式輸出，包含兩個鍵（鍵的名稱必須是代理的 agent_id 加上 "_dialogue"）：
"{first_id}_dialogue": "{first_name}說的話"
"{second_id}_dialogue": "{second_name}說的話"

確保對話內容簡短，每句話不超過30字。對話內容不要包含換行符。
"#,
            first_name = first.name,
            first_id = first.agent_id,
            first_persona = first.persona_summary,
            first_action = some_or_unknown(&first.original_action),
            first_memories = some_or_unknown(&first.recent_memories),
            second_name = second.name,
            second_id = second.agent_id,
            second_persona = second.persona_summary,
            second_action = some_or_unknown(&second.original_action),
            second_memories = some_or_unknown(&second.recent_memories),
        );

        let reply = self.generator.generate(&prompt).await?;
        let parsed: Value =
            parse_json_reply(&reply).context("dialogue reply was not the expected JSON")?;

        let line_for = |id: &str| -> String {
            parsed
                .get(format!("{id}_dialogue"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok((line_for(&a.agent_id), line_for(&b.agent_id)))
    }
}

fn some_or_unknown(text: &str) -> &str {
    if text.trim().is_empty() { "不詳" } else { text }
}

/// Parse the labeled 時間/地點/人物/事件 reply format.
pub(crate) fn parse_event_reply(reply: &str) -> Option<TownEvent> {
    let mut time = None;
    let mut location = None;
    let mut participants: Vec<String> = Vec::new();
    let mut description = None;

    for line in reply.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('：').or_else(|| line.split_once(':')) else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "時間" => time = normalize_clock_label(value),
            "地點" => location = Some(value.to_string()),
            "人物" => {
                participants = value
                    .split([',', '，'])
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect();
            }
            "事件" => description = Some(value.to_string()),
            _ => {}
        }
    }

    Some(TownEvent::new(time?, location?, participants, description?))
}
