//! Domain models: personas, schedules, events, poems, the town clock, and
//! configuration.

pub mod agent;
pub mod config;
pub mod event;
pub mod poem;
pub mod schedule;
pub mod sim_time;

pub use agent::{AgentState, Memory, MemoryKind, Persona};
pub use config::{
    Config, DeepSeekConfig, GeminiConfig, LlmConfig, LoggingConfig, MeetingPlan, RetryConfig,
    ServerConfig, SimulationConfig, SpecialCondition, TtsConfig,
};
pub use event::TownEvent;
pub use poem::{Poem, TriggerOutcome};
pub use schedule::{QuarterSchedule, ScheduleEntry};
pub use sim_time::GameTime;
