//! Poems and the trigger payloads that carry them.

use serde::{Deserialize, Serialize};

/// A generated poem in both scripts.
///
/// The poem model is asked for a strict JSON object keyed by script name;
/// the renames keep the wire shape it was prompted for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poem {
    #[serde(rename = "簡")]
    pub simplified: String,
    #[serde(rename = "繁")]
    pub traditional: String,
}

/// Outcome of a special-event check for one schedule entry.
///
/// Published under the agent's trigger key whether or not the event fired,
/// so consumers can distinguish "checked, nothing special" from "not yet
/// checked".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerOutcome {
    /// The `HH:MM` label of the entry that was checked.
    pub time: String,
    pub fired: bool,
    /// Poem text recited for the event; empty when not fired.
    #[serde(default)]
    pub poem: String,
    /// Label of the synthesized audio clip; empty when not fired.
    #[serde(default)]
    pub sound: String,
}

impl TriggerOutcome {
    /// The payload for an entry that matched a special event.
    pub fn fired(time: impl Into<String>, poem: impl Into<String>, sound: impl Into<String>) -> Self {
        Self { time: time.into(), fired: true, poem: poem.into(), sound: sound.into() }
    }

    /// The payload for an ordinary entry.
    pub fn not_fired(time: impl Into<String>) -> Self {
        Self { time: time.into(), fired: false, poem: String::new(), sound: String::new() }
    }
}
