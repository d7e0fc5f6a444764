use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Deadline, Priority, Status};
use crate::urgency::{UrgencyLevel, classify, remaining_text, sort_by_urgency};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BoardFilter {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub priority: PriorityFilter,
}

impl BoardFilter {
    pub fn matches(&self, deadline: &Deadline) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Pending => deadline.status == Status::Pending,
            StatusFilter::Completed => deadline.status == Status::Completed,
        };
        let priority_ok = match self.priority {
            PriorityFilter::All => true,
            PriorityFilter::High => deadline.priority == Priority::High,
            PriorityFilter::Medium => deadline.priority == Priority::Medium,
            PriorityFilter::Low => deadline.priority == Priority::Low,
        };
        status_ok && priority_ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub pending: usize,
    pub completed: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl FilterCounts {
    pub fn tally(deadlines: &[Deadline]) -> Self {
        deadlines.iter().fold(Self::default(), |mut counts, d| {
            counts.all += 1;
            match d.status {
                Status::Pending => counts.pending += 1,
                Status::Completed => counts.completed += 1,
            }
            match d.priority {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardEntry {
    #[serde(flatten)]
    pub deadline: Deadline,
    pub urgency: UrgencyLevel,
    pub remaining: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    pub generated_at: DateTime<Utc>,
    pub filter_counts: FilterCounts,
    pub items: Vec<BoardEntry>,
}

/// Builds the list view of one snapshot, with every entry evaluated at `now`.
///
/// Counts cover the whole snapshot so filter tabs can show totals; `items`
/// holds only the entries the filter keeps, in urgency order.
pub fn build_board(snapshot: &[Deadline], filter: BoardFilter, now: DateTime<Utc>) -> Board {
    let filter_counts = FilterCounts::tally(snapshot);

    let visible: Vec<Deadline> = snapshot
        .iter()
        .filter(|d| filter.matches(d))
        .cloned()
        .collect();

    let items = sort_by_urgency(&visible, now)
        .into_iter()
        .map(|deadline| BoardEntry {
            urgency: classify(deadline.due_date, now),
            remaining: remaining_text(deadline.due_date, now),
            deadline,
        })
        .collect();

    Board {
        generated_at: now,
        filter_counts,
        items,
    }
}
