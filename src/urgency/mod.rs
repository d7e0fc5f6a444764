//! Urgency classification for deadlines.
//!
//! Everything here is a pure function of a due date and an explicit `now`.
//! Nothing in this module reads the wall clock; callers pass the instant they
//! evaluate at (see [`crate::clock::Clock`]).

pub mod sort;
pub mod ticker;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub use sort::sort_by_urgency;
pub use ticker::CountdownTicker;

/// Remaining time below this many whole hours counts as urgent.
const URGENT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Overdue,
    Urgent,
    Safe,
}

impl UrgencyLevel {
    /// Sort rank: overdue 0, urgent 1, safe 2.
    pub fn rank(self) -> u8 {
        match self {
            UrgencyLevel::Overdue => 0,
            UrgencyLevel::Urgent => 1,
            UrgencyLevel::Safe => 2,
        }
    }
}

/// Urgency and remaining-time label evaluated at the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub urgency: UrgencyLevel,
    pub remaining: String,
}

/// Classifies `due_date` relative to `now`.
///
/// A deadline due exactly at `now` is already overdue. Otherwise the gap is
/// truncated to whole hours, so 23h59m left is urgent and 24h00m is safe.
pub fn classify(due_date: DateTime<Utc>, now: DateTime<Utc>) -> UrgencyLevel {
    if is_past(due_date, now) {
        return UrgencyLevel::Overdue;
    }

    if (due_date - now).num_hours() < URGENT_WINDOW_HOURS {
        UrgencyLevel::Urgent
    } else {
        UrgencyLevel::Safe
    }
}

/// Short label for the time left until (or elapsed since) `due_date`.
///
/// At most two units are shown and precision drops as the gap grows:
/// `"2d 3h"`, `"5h 12m"`, `"4m 9s"`, `"17s"` ahead of the deadline, and
/// `"3d overdue"`, `"2h overdue"`, `"0m overdue"` after it.
pub fn remaining_text(due_date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if is_past(due_date, now) {
        let elapsed = WholeUnits::of(now - due_date);
        if elapsed.days > 0 {
            return format!("{}d overdue", elapsed.days);
        }
        if elapsed.hours > 0 {
            return format!("{}h overdue", elapsed.hours);
        }
        return format!("{}m overdue", elapsed.minutes);
    }

    let left = WholeUnits::of(due_date - now);
    if left.hours >= URGENT_WINDOW_HOURS {
        format!("{}d {}h", left.days, left.hours % 24)
    } else if left.hours > 0 {
        format!("{}h {}m", left.hours, left.minutes % 60)
    } else if left.minutes > 0 {
        format!("{}m {}s", left.minutes, left.seconds % 60)
    } else {
        format!("{}s", left.seconds)
    }
}

pub fn countdown(due_date: DateTime<Utc>, now: DateTime<Utc>) -> Countdown {
    Countdown {
        urgency: classify(due_date, now),
        remaining: remaining_text(due_date, now),
    }
}

fn is_past(due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due_date <= now
}

/// Truncated totals of a non-negative span. Each field is the whole span in
/// that unit, not a remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WholeUnits {
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl WholeUnits {
    fn of(span: TimeDelta) -> Self {
        let span = span.abs();
        let hours = span.num_hours();
        Self {
            days: hours / 24,
            hours,
            minutes: span.num_minutes(),
            seconds: span.num_seconds(),
        }
    }
}
