//! Schedule entries produced by the planners.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One planned block of an agent's day.
///
/// Entries come back from the language model as JSON; the `time` alias
/// covers the quarter-schedule shape, which names the field differently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    #[serde(alias = "time")]
    pub time_str: String,
    pub location: String,
    pub action: String,
    #[serde(default)]
    pub thought: String,
    #[serde(default)]
    pub dialogue: String,
}

/// Quarter-hour refinement of a day plan, keyed by `HH:MM` label.
///
/// A `BTreeMap` keeps the labels sorted; insertion order carries nothing.
pub type QuarterSchedule = BTreeMap<String, ScheduleEntry>;
