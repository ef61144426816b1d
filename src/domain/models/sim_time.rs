//! The simulated town clock.
//!
//! The town runs on the twelve traditional double-hour periods (時辰), each
//! split into five quarter marks. Schedule entries carry labels such as
//! `卯時初刻`; planners sometimes emit the compact form `卯初刻`. Quarter
//! schedules and random events use western `HH:MM` labels instead, which are
//! carried as opaque strings but normalized to a zero-padded form.

use std::cmp::Ordering;
use std::fmt;

/// The twelve double-hour periods, in day order starting at midnight.
pub const PERIODS: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

/// The five quarter marks inside one period.
pub const QUARTER_MARKS: [&str; 5] = ["初刻", "一刻", "二刻", "三刻", "正"];

/// One position of the town clock: a period plus a quarter mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameTime {
    period: usize,
    quarter: usize,
}

impl GameTime {
    /// Build from raw indices. Out-of-range indices are rejected.
    pub fn new(period: usize, quarter: usize) -> Option<Self> {
        (period < PERIODS.len() && quarter < QUARTER_MARKS.len())
            .then_some(Self { period, quarter })
    }

    /// The label that starts a new simulated day (卯時初刻).
    pub fn day_start() -> Self {
        Self { period: 3, quarter: 0 }
    }

    /// Parse `卯時初刻` or the compact `卯初刻`.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some((period, quarter)) = label.split_once('時') {
            return Self::from_parts(period, quarter);
        }
        let mut chars = label.chars();
        let first = chars.next()?;
        let rest = chars.as_str();
        if rest.is_empty() {
            return None;
        }
        Self::from_parts(&first.to_string(), rest)
    }

    fn from_parts(period: &str, quarter: &str) -> Option<Self> {
        let period = PERIODS.iter().position(|p| *p == period)?;
        let quarter = QUARTER_MARKS.iter().position(|q| *q == quarter)?;
        Some(Self { period, quarter })
    }

    /// The next quarter mark, or `None` past the end of the day (亥正).
    pub fn next(self) -> Option<Self> {
        if self.quarter + 1 < QUARTER_MARKS.len() {
            Some(Self { period: self.period, quarter: self.quarter + 1 })
        } else if self.period + 1 < PERIODS.len() {
            Some(Self { period: self.period + 1, quarter: 0 })
        } else {
            None
        }
    }

    pub fn period_index(self) -> usize {
        self.period
    }

    pub fn quarter_index(self) -> usize {
        self.quarter
    }

    /// The canonical `卯時初刻` form.
    pub fn label(self) -> String {
        format!("{}時{}", PERIODS[self.period], QUARTER_MARKS[self.quarter])
    }

    /// Approximate western clock label for this tick.
    ///
    /// A period spans two hours starting on the odd hour (卯 = 05:00), and
    /// the five quarter marks split it into 24-minute steps. Random events
    /// carry `HH:MM` stamps; this mapping decides when they fall due.
    pub fn approx_clock_label(self) -> String {
        let start_minutes = ((2 * self.period as u32 + 23) % 24) * 60;
        let total = (start_minutes + self.quarter as u32 * 24) % (24 * 60);
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Order two schedule labels the way the town clock runs.
///
/// Labels that do not parse compare as equal, so a malformed entry neither
/// jumps ahead of nor trails the rest of a schedule.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (GameTime::parse(a), GameTime::parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Normalize a western clock label to zero-padded `HH:MM`.
///
/// Accepts `HH:MM`, `H:MM`, and the digit-run forms `HMM` / `HHMM` that the
/// event generator produces. Returns `None` for anything else.
pub fn normalize_clock_label(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (hour, minute) = if let Some((h, m)) = raw.split_once(':') {
        (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)
    } else if raw.len() == 3 && raw.chars().all(|c| c.is_ascii_digit()) {
        (raw[..1].parse().ok()?, raw[1..].parse().ok()?)
    } else if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        (raw[..2].parse().ok()?, raw[2..].parse().ok()?)
    } else {
        return None;
    };
    (hour < 24 && minute < 60).then(|| format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_labels() {
        let t = GameTime::parse("卯時初刻").unwrap();
        assert_eq!(t.period_index(), 3);
        assert_eq!(t.quarter_index(), 0);
        assert_eq!(t.label(), "卯時初刻");
    }

    #[test]
    fn parses_compact_labels() {
        let t = GameTime::parse("辰三刻").unwrap();
        assert_eq!(t.label(), "辰時三刻");
    }

    #[test]
    fn rejects_garbage() {
        assert!(GameTime::parse("").is_none());
        assert!(GameTime::parse("早上八點").is_none());
        assert!(GameTime::parse("卯").is_none());
    }

    #[test]
    fn orders_by_period_then_quarter() {
        assert_eq!(compare_labels("卯時初刻", "卯時一刻"), Ordering::Less);
        assert_eq!(compare_labels("戌時正", "卯時初刻"), Ordering::Greater);
        assert_eq!(compare_labels("午時二刻", "午時二刻"), Ordering::Equal);
    }

    #[test]
    fn unparseable_labels_compare_equal() {
        assert_eq!(compare_labels("08:00", "卯時初刻"), Ordering::Equal);
        assert_eq!(compare_labels("nonsense", "也不是時間"), Ordering::Equal);
    }

    #[test]
    fn steps_across_period_boundaries() {
        let t = GameTime::parse("卯時正").unwrap();
        assert_eq!(t.next().unwrap().label(), "辰時初刻");
        let end = GameTime::new(11, 4).unwrap();
        assert!(end.next().is_none());
    }

    #[test]
    fn approximates_western_clock_labels() {
        assert_eq!(GameTime::day_start().approx_clock_label(), "05:00");
        assert_eq!(GameTime::parse("卯時正").unwrap().approx_clock_label(), "06:36");
        assert_eq!(GameTime::parse("子時初刻").unwrap().approx_clock_label(), "23:00");
    }

    #[test]
    fn normalizes_clock_labels() {
        assert_eq!(normalize_clock_label("900").as_deref(), Some("09:00"));
        assert_eq!(normalize_clock_label("1030").as_deref(), Some("10:30"));
        assert_eq!(normalize_clock_label("8:15").as_deref(), Some("08:15"));
        assert_eq!(normalize_clock_label("08:15").as_deref(), Some("08:15"));
        assert_eq!(normalize_clock_label("2500"), None);
        assert_eq!(normalize_clock_label("noon"), None);
    }
}
