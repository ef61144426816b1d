//! Service layer: the rendezvous cache and the producers that feed it.

pub mod encounter;
pub mod keys;
pub mod planner;
pub mod poem;
pub mod rendezvous;
pub mod simulation;
pub mod trigger;

pub use encounter::EncounterService;
pub use planner::{Planner, SharedCache};
pub use poem::PoemService;
pub use rendezvous::RendezvousCache;
pub use simulation::Simulation;
pub use trigger::TriggerService;
