//! Cache key naming.
//!
//! The naming convention belongs to the producers; the cache itself treats
//! keys as opaque strings. Consumers build the same keys from request
//! parameters.

/// Hour-granularity day plan for an agent.
pub fn hour_schedule(agent_name: &str) -> String {
    format!("sch_{agent_name}_hour")
}

/// Quarter-hour refinement of the day plan.
pub fn quarter_schedule(agent_name: &str) -> String {
    format!("sch_{agent_name}_15_minute")
}

/// One quarter-hour entry, addressable by clock label.
pub fn quarter_entry(agent_name: &str, clock_label: &str) -> String {
    format!("sch_{agent_name}_15_minute_{clock_label}")
}

/// Special-event trigger outcome for one quarter-hour entry.
pub fn trigger(agent_name: &str, clock_label: &str) -> String {
    format!("trigger_{agent_name}_{clock_label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_published_convention() {
        assert_eq!(hour_schedule("李白"), "sch_李白_hour");
        assert_eq!(quarter_schedule("李白"), "sch_李白_15_minute");
        assert_eq!(quarter_entry("李白", "08:00"), "sch_李白_15_minute_08:00");
        assert_eq!(trigger("李白", "08:00"), "trigger_李白_08:00");
    }
}
