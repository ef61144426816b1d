//! Random encounter events scattered over the simulated day.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chance encounter between two townsfolk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TownEvent {
    pub id: Uuid,
    /// Normalized `HH:MM` label for when the event fires.
    pub time: String,
    pub location: String,
    pub participants: Vec<String>,
    pub description: String,
}

impl TownEvent {
    pub fn new(
        time: impl Into<String>,
        location: impl Into<String>,
        participants: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: time.into(),
            location: location.into(),
            participants,
            description: description.into(),
        }
    }
}
