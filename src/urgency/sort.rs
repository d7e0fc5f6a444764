use chrono::{DateTime, Utc};

use crate::models::Deadline;
use crate::urgency::classify;

/// Returns `deadlines` in display order without touching the input.
///
/// Keys, each consulted only on a tie of the previous one: pending before
/// completed, urgency rank at `now`, due date ascending. The sort is stable,
/// so entries with equal keys keep their input order.
pub fn sort_by_urgency(deadlines: &[Deadline], now: DateTime<Utc>) -> Vec<Deadline> {
    let mut sorted = deadlines.to_vec();
    sorted.sort_by_key(|d| {
        (
            d.status.is_completed(),
            classify(d.due_date, now).rank(),
            d.due_date,
        )
    });
    sorted
}
