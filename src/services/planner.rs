//! Per-agent daily planning pipeline.
//!
//! One background job per agent: plan the day at hour granularity, refine it
//! to quarter hours, then fan the refined entries out under per-time keys so
//! request handlers can fetch exactly the slot they are asked about. Every
//! stage publishes through the rendezvous cache; the fan-out stage consumes
//! the refinement through the cache too, so it starts the moment the value
//! lands, regardless of which job produced it.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::models::{Persona, QuarterSchedule, ScheduleEntry, TriggerOutcome};
use crate::domain::ports::TextGenerator;
use crate::infrastructure::llm::sanitize::parse_json_reply;

use super::keys;
use super::poem::{signature_poem, PoemService};
use super::rendezvous::RendezvousCache;
use super::trigger::TriggerService;

/// The shared cache instance, holding opaque JSON payloads.
pub type SharedCache = Arc<RendezvousCache<Value>>;

#[derive(Clone)]
pub struct Planner {
    generator: Arc<dyn TextGenerator>,
    cache: SharedCache,
    trigger: Arc<TriggerService>,
    poems: Arc<PoemService>,
    locations: Vec<String>,
}

impl Planner {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        cache: SharedCache,
        trigger: Arc<TriggerService>,
        poems: Arc<PoemService>,
        locations: Vec<String>,
    ) -> Self {
        Self { generator, cache, trigger, poems, locations }
    }

    /// Run the whole pipeline for one agent.
    pub async fn run_for_agent(&self, persona: &Persona) -> Result<()> {
        info!(agent = %persona.name, "planning started");
        self.plan_hours(persona).await?;
        let hour_schedule = self.cache.wait_for(&keys::hour_schedule(&persona.name)).await;
        self.plan_quarters(persona, &hour_schedule).await?;
        self.fan_out(persona).await?;
        info!(agent = %persona.name, "planning finished");
        Ok(())
    }

    /// Hour-granularity day plan, published under the agent's hour key.
    pub async fn plan_hours(&self, persona: &Persona) -> Result<()> {
        let prompt = format!(
            r#"
角色名稱: {name}
年齡: {age}
個性: {personality}
風格: {style}
住處: {home}
人際關係: {relations}
可選地點清單: {locations}

請為 {name} 規劃一份從卯時到戌時的日程表，每個時辰一個條目。
每個條目應包含：
1. "time_str": (字串) 時間描述（例如："卯時初刻"）
2. "location": (字串) 地點（必須從「可選地點清單」中選擇）
3. "action": (字串) 具體活動
4. "thought": (字串) 內心想法
5. "dialogue": (字串，可選) 若有自言自語則填寫，否則留空 ""

請嚴格以JSON列表格式輸出，不要包含任何JSON格式以外的文字或解釋。
"#,
            name = persona.name,
            age = persona.age,
            personality = persona.personality,
            style = persona.style,
            home = persona.home,
            relations = persona.relations,
            locations = self.locations.join(", "),
        );

        let reply = self.generator.generate(&prompt).await?;
        let entries: Vec<ScheduleEntry> = parse_json_reply(&reply)
            .with_context(|| format!("hour plan for {} did not parse", persona.name))?;

        let payload = serde_json::to_value(&entries)?;
        self.cache.put(keys::hour_schedule(&persona.name), payload);
        info!(agent = %persona.name, entries = entries.len(), "hour plan published");
        Ok(())
    }

    /// Quarter-hour refinement, published under the agent's quarter key.
    pub async fn plan_quarters(&self, persona: &Persona, hour_schedule: &Value) -> Result<()> {
        let prompt = format!(
            r#"
角色名稱: {name}
年齡: {age}
個性: {personality}
風格: {style}
住處: {home}
人際關係: {relations}
可選地點清單: {locations}

以下是 {name} 今天的時辰日程表：
{hours}

請把這份日程細化成每15分鐘一格的日程，時間從 06:00 到 23:00。
請嚴格以JSON物件格式輸出：鍵為 "HH:MM" 格式的時間，值為該時段的條目。
每個條目應包含：
1. "time": (字串) 與鍵相同的時間
2. "location": (字串) 地點（必須從「可選地點清單」中選擇）
3. "action": (字串) 具體活動
4. "thought": (字串) 內心想法
5. "dialogue": (字串，可選) 若有對話則填寫，否則留空 ""
不要包含任何JSON格式以外的文字或解釋。
"#,
            name = persona.name,
            age = persona.age,
            personality = persona.personality,
            style = persona.style,
            home = persona.home,
            relations = persona.relations,
            locations = self.locations.join(", "),
            hours = serde_json::to_string_pretty(hour_schedule)?,
        );

        let reply = self.generator.generate(&prompt).await?;
        let quarters: QuarterSchedule = parse_json_reply(&reply)
            .with_context(|| format!("quarter plan for {} did not parse", persona.name))?;

        let payload = serde_json::to_value(&quarters)?;
        self.cache.put(keys::quarter_schedule(&persona.name), payload);
        info!(agent = %persona.name, slots = quarters.len(), "quarter plan published");
        Ok(())
    }

    /// Publish every quarter entry under its per-time key, with its trigger
    /// outcome alongside.
    pub async fn fan_out(&self, persona: &Persona) -> Result<()> {
        let payload = self
            .cache
            .wait_for(&keys::quarter_schedule(&persona.name))
            .await;
        let quarters: QuarterSchedule = serde_json::from_value(payload)
            .with_context(|| format!("cached quarter plan for {} is malformed", persona.name))?;

        for (label, entry) in &quarters {
            self.cache
                .put(keys::quarter_entry(&persona.name, label), serde_json::to_value(entry)?);

            let outcome = self.check_trigger(persona, label, entry).await;
            self.cache
                .put(keys::trigger(&persona.name, label), serde_json::to_value(&outcome)?);
        }
        Ok(())
    }

    /// Evaluate the special-event trigger for one entry.
    ///
    /// Never fails the pipeline: an undecidable trigger is published as
    /// not-fired so consumers see a definite answer for every slot.
    async fn check_trigger(
        &self,
        persona: &Persona,
        label: &str,
        entry: &ScheduleEntry,
    ) -> TriggerOutcome {
        let fired = match self.trigger.is_special(&persona.name, entry).await {
            Ok(fired) => fired,
            Err(err) => {
                warn!(agent = %persona.name, slot = label, error = %err, "trigger check failed");
                false
            }
        };
        if !fired {
            return TriggerOutcome::not_fired(label);
        }

        if let Some(text) = signature_poem(&persona.name) {
            return TriggerOutcome::fired(label, text, &persona.name);
        }

        let sound_label = format!("{}_{}", persona.name, label);
        match self.poems.recite(&sound_label).await {
            Ok(poem) => TriggerOutcome::fired(label, poem.traditional, sound_label),
            Err(err) => {
                warn!(agent = %persona.name, slot = label, error = %err, "poem generation failed");
                TriggerOutcome::fired(label, String::new(), String::new())
            }
        }
    }
}
