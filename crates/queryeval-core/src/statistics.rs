//! Session progress statistics.

use serde::{Deserialize, Serialize};

use crate::model::Status;
use crate::records::RecordStore;

/// Placeholder shown when there is no average to display.
pub const NO_AVERAGE: &str = "—";

/// Counts and averages over a session's record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub reviewed: usize,
    /// Tasks not yet completed (`total - completed`).
    pub remaining: usize,
    /// `completed / total * 100`, or 0 for an empty catalog.
    pub completion_percent: f64,
    /// Rounded mean seconds per completed task; `None` with nothing completed.
    pub average_time_secs: Option<u64>,
}

impl SessionStats {
    pub fn compute(records: &RecordStore) -> Self {
        let total = records.len();
        let completed = records.completed_count();
        Self {
            total,
            pending: records.count(Status::Pending),
            in_progress: records.count(Status::InProgress),
            completed,
            reviewed: records.count(Status::Reviewed),
            remaining: total - completed,
            completion_percent: completion_percent(completed, total),
            average_time_secs: average_time_secs(records.total_time_secs(), completed),
        }
    }
}

/// `completed / total * 100`, guarding the empty case.
pub fn completion_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Sum of recorded time divided by the completed count, rounded half up.
pub fn average_time_secs(total_secs: u64, completed: usize) -> Option<u64> {
    if completed == 0 {
        return None;
    }
    Some((total_secs as f64 / completed as f64).round() as u64)
}

/// Render an average for display, e.g. `"14s"` or the placeholder.
pub fn format_average(average: Option<u64>) -> String {
    match average {
        Some(secs) => format!("{secs}s"),
        None => NO_AVERAGE.to_string(),
    }
}
