//! The simulated town: agents, events, and the day loop.
//!
//! The HTTP layer drives this lazily (each state request advances the town
//! to the requested time) while the `simulate` command runs a whole day
//! offline. Day plans are regenerated on the new-day boundary (卯時初刻) or
//! whenever an agent has none.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::sim_time::compare_labels;
use crate::domain::models::{
    AgentState, GameTime, MemoryKind, ScheduleEntry, SimulationConfig, TownEvent,
};
use crate::domain::ports::TextGenerator;
use crate::infrastructure::llm::sanitize::parse_json_reply;

use super::encounter::{EncounterService, SpeakerProfile};

pub struct Simulation {
    config: SimulationConfig,
    agents: Vec<AgentState>,
    events: Vec<TownEvent>,
    fired_events: HashSet<Uuid>,
    generator: Arc<dyn TextGenerator>,
    encounters: EncounterService,
    date_label: String,
}

impl Simulation {
    pub fn new(
        config: SimulationConfig,
        generator: Arc<dyn TextGenerator>,
        encounters: EncounterService,
    ) -> Self {
        let agents = config
            .personas
            .iter()
            .map(|p| AgentState::new(p.clone(), config.max_memories))
            .collect();
        let date_label = chrono::Local::now().format("%Y年%m月%d日").to_string();
        Self {
            config,
            agents,
            events: Vec::new(),
            fired_events: HashSet::new(),
            generator,
            encounters,
            date_label,
        }
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    /// Regenerate day plans where needed: on a new day, or for agents that
    /// have none yet. A failed plan leaves that agent idle rather than
    /// taking the town down.
    pub async fn ensure_daily_plans(&mut self, time_label: &str) -> Result<()> {
        let new_day = time_label == GameTime::day_start().label();
        for idx in 0..self.agents.len() {
            if new_day || !self.agents[idx].has_schedule() {
                if let Err(err) = self.generate_daily_plan(idx, time_label).await {
                    warn!(
                        agent = %self.agents[idx].persona.name,
                        error = %err,
                        "daily plan generation failed"
                    );
                }
            }
        }
        Ok(())
    }

    async fn generate_daily_plan(&mut self, idx: usize, time_label: &str) -> Result<()> {
        let (prompt, agent_id, agent_name) = {
            let agent = &self.agents[idx];
            let reflection = self.reflection_for(agent);
            let prompt = format!(
                r#"
角色名稱: {name}
角色人設: {persona}
今日日期: {date} ({time_label})
最近的記憶/反思: {reflection}
可選地點清單: {locations}
主要目標: 根據他的人設和最近記憶，他今天可能想做什麼？

請為 {name} 規劃一份從卯時到戌時的詳細日程表。
日程表應包含以下時辰點：卯時初刻, 卯時二刻, 辰時初刻, 辰時三刻, 巳時二刻, 巳時三刻, 午時初刻, 未時初刻, 未時二刻, 申時初刻, 酉時初刻, 戌時初刻。
每個條目應包含：
1. "time_str": (字串) 時間描述 (例如："卯時初刻")
2. "location": (字串) 地點 (必須從提供的「可選地點清單」中選擇)
3. "action": (字串) 具體活動 (簡潔描述)
4. "thought": (字串) 內心想法
5. "dialogue": (字串, 可選) 如果此活動涉及與人交談或自言自語，則填寫，否則留空 ""。對話內容不要包含換行符。

請嚴格以JSON列表格式輸出，不要包含任何JSON格式以外的文字或解釋。
範例單個條目：{{"time_str": "卯時初刻", "location": "河邊", "action": "起床、整理儀容", "thought": "（一日之計在於晨。）", "dialogue": ""}}
"#,
                name = agent.persona.name,
                persona = agent.persona.summary(),
                date = self.date_label,
                locations = self.config.locations.join(", "),
            );
            (prompt, agent.persona.id.clone(), agent.persona.name.clone())
        };

        let reply = self.generator.generate(&prompt).await?;
        let mut schedule: Vec<ScheduleEntry> = parse_json_reply(&reply)
            .with_context(|| format!("day plan for {agent_name} did not parse"))?;

        let meeting = self.config.meeting.clone();
        let agent = &mut self.agents[idx];
        if meeting.agent_ids.contains(&agent_id) {
            if let Some(entry) = schedule.iter_mut().find(|e| e.time_str == meeting.time) {
                agent.planned_action_at_meeting = Some(entry.action.clone());
                entry.location = meeting.location.clone();
                entry.action = format!("在 {} 準備與人會面", meeting.location);
                entry.thought = format!("（約好在 {} 見面，不知道是誰。）", meeting.location);
                entry.dialogue.clear();
            } else {
                agent.planned_action_at_meeting = None;
                let placed = ScheduleEntry {
                    time_str: meeting.time.clone(),
                    location: meeting.location.clone(),
                    action: format!("在 {} 準備與人會面", meeting.location),
                    thought: format!("（應該是約在這個時候在 {} 見面。）", meeting.location),
                    dialogue: String::new(),
                };
                let pos = schedule
                    .iter()
                    .position(|e| compare_labels(&meeting.time, &e.time_str) == Ordering::Less)
                    .unwrap_or(schedule.len());
                schedule.insert(pos, placed);
            }
        }

        agent.schedule = schedule;
        agent.schedule_cursor = 0;
        agent.remember(
            time_label,
            MemoryKind::SystemEvent,
            format!("系統為 {agent_name} 生成了新的日程計劃。"),
            2,
            Vec::new(),
        );
        info!(agent = %agent_name, entries = agent.schedule.len(), "day plan generated");
        Ok(())
    }

    /// Recent observations and thoughts, for the planning prompt. Routine
    /// actions and plan bookkeeping say nothing about what tomorrow should
    /// look like.
    fn reflection_for(&self, agent: &AgentState) -> String {
        let recent: Vec<&str> = agent
            .recent_memories(self.config.recent_memories)
            .into_iter()
            .filter(|m| m.kind != MemoryKind::ActionTaken && m.kind != MemoryKind::SystemEvent)
            .map(|m| m.description.as_str())
            .collect();
        if recent.is_empty() {
            "昨日無特別反思。".to_string()
        } else {
            format!("最近的觀察和想法：{}", recent.join("；"))
        }
    }

    /// Scatter pre-built events over the day (used by tests and restarts).
    pub fn scatter_events(&mut self, events: Vec<TownEvent>) {
        self.events.extend(events);
        self.events.sort_by(|a, b| a.time.cmp(&b.time));
    }

    /// Ask the model for a handful of chance encounters.
    pub async fn generate_random_events(&mut self) {
        for _ in 0..self.config.random_events {
            match self.encounters.random_encounter().await {
                Ok(event) => self.events.push(event),
                Err(err) => warn!(error = %err, "random event generation failed"),
            }
        }
        self.events.sort_by(|a, b| a.time.cmp(&b.time));
        info!(events = self.events.len(), "random events scheduled");
    }

    /// Fire every not-yet-fired event due at or before the tick.
    fn apply_events(&mut self, game_label: &str, clock_label: &str) {
        let due: Vec<TownEvent> = self
            .events
            .iter()
            .filter(|e| !self.fired_events.contains(&e.id) && e.time.as_str() <= clock_label)
            .cloned()
            .collect();
        for event in due {
            self.fired_events.insert(event.id);
            info!(
                time = %event.time,
                location = %event.location,
                description = %event.description,
                "random event fired"
            );
            for agent in &mut self.agents {
                let involved = event.participants.contains(&agent.persona.name)
                    || agent.location == event.location;
                if involved {
                    agent.remember(
                        game_label,
                        MemoryKind::Observation,
                        format!("見證/參與事件: {}", event.description),
                        4,
                        Vec::new(),
                    );
                }
            }
        }
    }

    /// Advance the whole town to a game-time label.
    pub async fn advance_to(&mut self, label: &str) -> Result<()> {
        self.ensure_daily_plans(label).await?;

        if let Some(tick) = GameTime::parse(label) {
            let clock = tick.approx_clock_label();
            self.apply_events(label, &clock);
        }

        let meeting = self.config.meeting.clone();
        for agent in &mut self.agents {
            agent.update_for_time(label, &meeting);
        }

        if label == meeting.time {
            self.conduct_meeting(label).await;
        }

        self.record_observations(label);
        Ok(())
    }

    /// Generate the forced-meeting dialogue when everyone actually showed up.
    async fn conduct_meeting(&mut self, label: &str) {
        let meeting = self.config.meeting.clone();
        if meeting.agent_ids.len() < 2 {
            return;
        }
        let Some(ia) = self.index_of(&meeting.agent_ids[0]) else { return };
        let Some(ib) = self.index_of(&meeting.agent_ids[1]) else { return };
        if self.agents[ia].location != meeting.location
            || self.agents[ib].location != meeting.location
        {
            return;
        }

        let profile = |agent: &AgentState| SpeakerProfile {
            agent_id: agent.persona.id.clone(),
            name: agent.persona.name.clone(),
            persona_summary: agent.persona.summary(),
            original_action: agent.planned_action_at_meeting.clone().unwrap_or_default(),
            recent_memories: agent.recent_descriptions(
                3,
                &[
                    MemoryKind::Observation,
                    MemoryKind::ActionTaken,
                    MemoryKind::DialogueHeard,
                ],
            ),
        };
        let pa = profile(&self.agents[ia]);
        let pb = profile(&self.agents[ib]);

        let (line_a, line_b) = match self
            .encounters
            .meeting_dialogue(&pa, &pb, &meeting.location, label)
            .await
        {
            Ok(lines) => lines,
            Err(err) => {
                warn!(error = %err, "meeting dialogue generation failed");
                return;
            }
        };

        let name_a = pa.name.clone();
        let name_b = pb.name.clone();
        let id_a = pa.agent_id.clone();
        let id_b = pb.agent_id.clone();

        {
            let a = &mut self.agents[ia];
            a.dialogue = line_a.clone();
            a.action = format!("與 {} 在{}交談", name_b, meeting.location);
            if !line_a.is_empty() {
                a.remember(
                    label,
                    MemoryKind::DialogueSpoken,
                    format!("對 {name_b} 說：「{line_a}」"),
                    7,
                    vec![id_b.clone()],
                );
            }
            if !line_b.is_empty() {
                a.remember(
                    label,
                    MemoryKind::DialogueHeard,
                    format!("聽到 {name_b} 說：「{line_b}」"),
                    6,
                    vec![id_b.clone()],
                );
            }
        }
        {
            let b = &mut self.agents[ib];
            b.dialogue = line_b.clone();
            b.action = format!("與 {} 在{}交談", name_a, meeting.location);
            if !line_b.is_empty() {
                b.remember(
                    label,
                    MemoryKind::DialogueSpoken,
                    format!("對 {name_a} 說：「{line_b}」"),
                    7,
                    vec![id_a.clone()],
                );
            }
            if !line_a.is_empty() {
                b.remember(
                    label,
                    MemoryKind::DialogueHeard,
                    format!("聽到 {name_a} 說：「{line_a}」"),
                    6,
                    vec![id_a],
                );
            }
        }
    }

    /// Everyone notices who shares their location.
    fn record_observations(&mut self, label: &str) {
        let positions: Vec<(String, String, String)> = self
            .agents
            .iter()
            .map(|a| (a.persona.id.clone(), a.persona.name.clone(), a.location.clone()))
            .collect();

        for agent in &mut self.agents {
            let seen: Vec<&(String, String, String)> = positions
                .iter()
                .filter(|(id, _, loc)| *id != agent.persona.id && *loc == agent.location)
                .collect();
            if seen.is_empty() {
                continue;
            }
            let names: Vec<&str> = seen.iter().map(|(_, name, _)| name.as_str()).collect();
            let ids: Vec<String> = seen.iter().map(|(id, _, _)| id.clone()).collect();
            agent.remember(
                label,
                MemoryKind::Observation,
                format!("在 {} 看到了 {}。", agent.location, names.join(", ")),
                3,
                ids,
            );
        }
    }

    fn index_of(&self, agent_id: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.persona.id == agent_id)
    }

    /// Town state at a label, shaped for the HTTP layer.
    pub fn snapshot(&self, label: &str) -> Result<Value> {
        let mut agents = serde_json::Map::new();
        for agent in &self.agents {
            agents.insert(
                agent.persona.id.clone(),
                json!({
                    "name": agent.persona.name,
                    "location": agent.location,
                    "action": agent.action,
                    "thought": agent.thought,
                    "dialogue": agent.dialogue,
                    "schedule_today": agent.schedule,
                    "recent_memories": serde_json::to_value(
                        agent.recent_memories(self.config.recent_memories)
                    )?,
                }),
            );
        }
        Ok(json!({
            "current_game_time": label,
            "agents": agents,
        }))
    }

    /// Run one whole day offline: plans, events, every quarter tick, then a
    /// diary entry per agent.
    pub async fn run_day(&mut self) -> Result<()> {
        let start = GameTime::day_start();
        info!(date = %self.date_label, "simulation day starting");
        self.ensure_daily_plans(&start.label()).await?;
        self.generate_random_events().await;

        let mut tick = start;
        loop {
            let label = tick.label();
            self.advance_to(&label).await?;
            for agent in &self.agents {
                info!(
                    time = %label,
                    agent = %agent.persona.name,
                    location = %agent.location,
                    action = %agent.action,
                    "agent status"
                );
            }
            // 戌時正 closes the town's day.
            if tick.period_index() >= 10 && tick.quarter_index() == 4 {
                break;
            }
            match tick.next() {
                Some(next) => tick = next,
                None => break,
            }
        }

        self.write_diaries().await;
        info!(date = %self.date_label, "simulation day finished");
        Ok(())
    }

    /// First-person diary entries from each agent's day.
    async fn write_diaries(&mut self) {
        let date_label = self.date_label.clone();
        for idx in 0..self.agents.len() {
            let (prompt, name) = {
                let agent = &self.agents[idx];
                let memory_text: Vec<String> = agent
                    .recent_memories(10)
                    .into_iter()
                    .map(|m| format!("{}: {}", m.timestamp, m.description))
                    .collect();
                let prompt = format!(
                    r#"
角色: {name}
角色人設: {persona}
今日日期: {date}

以下是今天的重要記憶和活動:
{memories}

請以第一人稱的角度，寫一個簡短的日記式總結，表達{name}對今天經歷的感受、收穫和反思。
回應應包含對重要事件的感想，以及對明天的期望或計劃。請使用繁體中文，語調應符合角色人設。
"#,
                    name = agent.persona.name,
                    persona = agent.persona.summary(),
                    date = self.date_label,
                    memories = memory_text.join("\n"),
                );
                (prompt, agent.persona.name.clone())
            };

            match self.generator.generate(&prompt).await {
                Ok(diary) => {
                    info!(agent = %name, diary = %diary, "daily diary");
                    self.agents[idx].remember(
                        &date_label,
                        MemoryKind::SystemEvent,
                        format!("一天總結與反思: {diary}"),
                        6,
                        Vec::new(),
                    );
                }
                Err(err) => warn!(agent = %name, error = %err, "diary generation failed"),
            }
        }
    }
}
