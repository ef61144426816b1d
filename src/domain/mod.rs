//! Domain layer for the Yunmeng town simulation.
//!
//! Core models and business rules: personas, schedules, the simulated
//! clock, and the ports the rest of the system is wired through.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
