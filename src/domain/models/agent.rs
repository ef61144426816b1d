//! Town personas and their runtime state.

use std::cmp::Ordering;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::config::MeetingPlan;
use super::schedule::ScheduleEntry;
use super::sim_time::compare_labels;

/// Static description of one character, loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub age: String,
    pub personality: String,
    pub style: String,
    pub home: String,
    pub relations: String,
    pub initial_location: String,
}

impl Persona {
    /// One-paragraph summary used in prompts.
    pub fn summary(&self) -> String {
        format!(
            "{}，{}，個性是{}，風格是{}。住處：{}。關係：{}。",
            self.name, self.age, self.personality, self.style, self.home, self.relations
        )
    }
}

/// What a remembered moment was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Observation,
    ActionTaken,
    DialogueSpoken,
    DialogueHeard,
    MovementDecision,
    SystemEvent,
}

impl MemoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Observation => "observation",
            Self::ActionTaken => "action_taken",
            Self::DialogueSpoken => "dialogue_spoken",
            Self::DialogueHeard => "dialogue_heard",
            Self::MovementDecision => "movement_decision",
            Self::SystemEvent => "system_event",
        }
    }
}

/// One entry in an agent's memory stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Game-time label when the memory was formed.
    pub timestamp: String,
    pub kind: MemoryKind,
    pub description: String,
    pub importance: u8,
    #[serde(default)]
    pub related_agents: Vec<String>,
}

/// Mutable per-agent simulation state.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub persona: Persona,
    pub location: String,
    pub action: String,
    pub thought: String,
    pub dialogue: String,
    pub schedule: Vec<ScheduleEntry>,
    pub schedule_cursor: usize,
    /// What the agent had planned before the forced meeting displaced it.
    pub planned_action_at_meeting: Option<String>,
    memories: VecDeque<Memory>,
    max_memories: usize,
}

impl AgentState {
    pub fn new(persona: Persona, max_memories: usize) -> Self {
        let location = persona.initial_location.clone();
        Self {
            persona,
            location,
            action: "準備開始一天的生活".to_string(),
            thought: "（新的一天，充滿未知。）".to_string(),
            dialogue: String::new(),
            schedule: Vec::new(),
            schedule_cursor: 0,
            planned_action_at_meeting: None,
            memories: VecDeque::new(),
            max_memories,
        }
    }

    /// Append to the memory stream, evicting the oldest entry past capacity.
    pub fn remember(
        &mut self,
        timestamp: &str,
        kind: MemoryKind,
        description: String,
        importance: u8,
        related_agents: Vec<String>,
    ) {
        if self.memories.len() == self.max_memories {
            self.memories.pop_front();
        }
        self.memories.push_back(Memory {
            timestamp: timestamp.to_string(),
            kind,
            description,
            importance,
            related_agents,
        });
    }

    /// The most recent `n` memories, oldest first.
    pub fn recent_memories(&self, n: usize) -> Vec<&Memory> {
        let skip = self.memories.len().saturating_sub(n);
        self.memories.iter().skip(skip).collect()
    }

    /// Recent memory descriptions of the given kinds, joined for a prompt.
    pub fn recent_descriptions(&self, n: usize, kinds: &[MemoryKind]) -> String {
        let picked: Vec<&str> = self
            .memories
            .iter()
            .filter(|m| kinds.contains(&m.kind))
            .map(|m| m.description.as_str())
            .collect();
        let skip = picked.len().saturating_sub(n);
        picked[skip..].join("；")
    }

    /// Whether a day schedule has been produced for this agent.
    pub fn has_schedule(&self) -> bool {
        !self.schedule.is_empty()
    }

    /// Advance the agent to the given game-time label.
    ///
    /// Picks the latest schedule entry at or before the label, takes over its
    /// location/action/thought, records the action in memory, and turns the
    /// state into "travelling" when the schedule has already moved on to a
    /// different location. Scheduled dialogue is suppressed at the forced
    /// meeting slot, where generated dialogue replaces it.
    pub fn update_for_time(&mut self, label: &str, meeting: &MeetingPlan) {
        self.dialogue.clear();

        if self.schedule.is_empty() {
            self.action = "今日事已畢".to_string();
            self.thought = "（等待新的一天。）".to_string();
            return;
        }

        let mut latest: Option<usize> = None;
        for (i, entry) in self.schedule.iter().enumerate() {
            if compare_labels(&entry.time_str, label) != Ordering::Greater {
                latest = Some(i);
            } else {
                break;
            }
        }

        let Some(i) = latest else {
            // Before the first entry of the day.
            self.action = "等待日程開始".to_string();
            self.thought = "（一日之計在於晨。）".to_string();
            self.location = self.schedule[0].location.clone();
            self.schedule_cursor = 0;
            return;
        };

        let entry = self.schedule[i].clone();
        self.schedule_cursor = i + 1;
        self.location = entry.location.clone();
        self.action = entry.action.clone();
        self.thought = if entry.thought.is_empty() {
            "（執行中……）".to_string()
        } else {
            entry.thought.clone()
        };

        let at_meeting = label == meeting.time
            && meeting.agent_ids.contains(&self.persona.id)
            && self.location == meeting.location;
        if !entry.dialogue.is_empty() && !at_meeting {
            self.dialogue = entry.dialogue.clone();
        }

        let mut description = format!("在 {} 執行了「{}」。", self.location, self.action);
        if !self.dialogue.is_empty() {
            description.push_str(&format!(" 並說了：「{}」", self.dialogue));
        }
        let is_meeting_chat =
            at_meeting && self.action.contains('與') && self.action.contains("交談");
        if !is_meeting_chat {
            self.remember(label, MemoryKind::ActionTaken, description, 5, Vec::new());
        }

        // The schedule has moved past this entry: head for the next location.
        if compare_labels(&entry.time_str, label) == Ordering::Less {
            if let Some(next) = self.schedule.get(self.schedule_cursor) {
                if next.location != self.location {
                    let from = self.location.clone();
                    self.action = format!("前往 {}", next.location);
                    self.thought = format!("（正從 {} 趕往 {}。）", from, next.location);
                    self.dialogue.clear();
                    self.remember(
                        label,
                        MemoryKind::MovementDecision,
                        format!("決定從 {} 前往 {}。", from, next.location),
                        4,
                        Vec::new(),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> Persona {
        Persona {
            id: "li_bai".to_string(),
            name: "李白".to_string(),
            age: "45歲".to_string(),
            personality: "崇尚自由".to_string(),
            style: "隨意".to_string(),
            home: "河邊".to_string(),
            relations: "與莊子是好友".to_string(),
            initial_location: "河邊".to_string(),
        }
    }

    fn entry(time: &str, location: &str, action: &str) -> ScheduleEntry {
        ScheduleEntry {
            time_str: time.to_string(),
            location: location.to_string(),
            action: action.to_string(),
            thought: String::new(),
            dialogue: String::new(),
        }
    }

    fn meeting() -> MeetingPlan {
        MeetingPlan {
            time: "辰時三刻".to_string(),
            location: "酒館".to_string(),
            agent_ids: vec!["li_bai".to_string(), "li_qing_zhao".to_string()],
        }
    }

    #[test]
    fn memory_stream_is_bounded() {
        let mut state = AgentState::new(persona(), 3);
        for i in 0..5 {
            state.remember("卯時初刻", MemoryKind::Observation, format!("m{i}"), 1, vec![]);
        }
        let recent: Vec<_> = state.recent_memories(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].description, "m2");
        assert_eq!(recent[2].description, "m4");
    }

    #[test]
    fn no_schedule_means_idle() {
        let mut state = AgentState::new(persona(), 10);
        state.update_for_time("卯時初刻", &meeting());
        assert_eq!(state.action, "今日事已畢");
    }

    #[test]
    fn before_first_entry_waits_at_its_location() {
        let mut state = AgentState::new(persona(), 10);
        state.schedule = vec![entry("辰時初刻", "書院", "讀書")];
        state.update_for_time("卯時初刻", &meeting());
        assert_eq!(state.action, "等待日程開始");
        assert_eq!(state.location, "書院");
    }

    #[test]
    fn picks_latest_applicable_entry() {
        let mut state = AgentState::new(persona(), 10);
        state.schedule = vec![
            entry("卯時初刻", "河邊", "起床"),
            entry("辰時初刻", "酒館", "喝酒"),
            entry("巳時初刻", "書院", "聽課"),
        ];
        state.update_for_time("辰時二刻", &meeting());
        // Past 辰時初刻, and the next entry is elsewhere, so we're travelling.
        assert_eq!(state.action, "前往 書院");
        assert!(state.thought.contains("趕往"));
    }

    #[test]
    fn exact_slot_keeps_the_entry_action() {
        let mut state = AgentState::new(persona(), 10);
        state.schedule = vec![entry("辰時初刻", "酒館", "喝酒")];
        state.update_for_time("辰時初刻", &meeting());
        assert_eq!(state.action, "喝酒");
        assert_eq!(state.location, "酒館");
    }

    #[test]
    fn scheduled_dialogue_is_suppressed_at_the_meeting_slot() {
        let mut state = AgentState::new(persona(), 10);
        let mut e = entry("辰時三刻", "酒館", "與人交談");
        e.dialogue = "自言自語".to_string();
        state.schedule = vec![e];
        state.update_for_time("辰時三刻", &meeting());
        assert!(state.dialogue.is_empty());
    }
}
