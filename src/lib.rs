//! Yunmeng - LLM-driven town simulation backend
//!
//! A small backend that asks language models to produce daily schedules,
//! dialogue and poems for a handful of fictional townsfolk, and serves the
//! resulting state over HTTP. Producers and consumers meet in the middle at
//! a blocking key-value rendezvous cache: background jobs publish named
//! results as they finish, and request handlers wait, bounded, for values
//! that may not exist yet.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, the town clock, and ports
//! - **Service Layer** (`services`): the rendezvous cache, planners,
//!   triggers, poems, encounters, and the simulation loop
//! - **Infrastructure Layer** (`infrastructure`): provider adapters and
//!   configuration loading
//! - **Adapters** (`adapters`): the HTTP state server
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::http::{StateHttpConfig, StateHttpServer};
pub use domain::models::{Config, GameTime, Persona, ScheduleEntry, TriggerOutcome};
pub use domain::ports::{SpeechSynthesizer, TextGenerator};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Planner, RendezvousCache, SharedCache, Simulation};
