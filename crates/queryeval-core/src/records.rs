//! In-memory evaluation record store.
//!
//! Holds exactly one [`TaskStatus`] per catalog task, at the same position,
//! plus the instant each task most recently became current.

use tokio::time::Instant;

use crate::error::SessionError;
use crate::model::{EvaluationResponse, Status, TaskCatalog, TaskStatus};

#[derive(Debug, Clone)]
struct Entry {
    status: TaskStatus,
    became_current_at: Option<Instant>,
}

/// Status, timing and submitted response for every task in a catalog.
#[derive(Debug, Clone)]
pub struct RecordStore {
    entries: Vec<Entry>,
}

impl RecordStore {
    pub fn new(catalog: &TaskCatalog) -> Self {
        let entries = catalog
            .tasks
            .iter()
            .map(|task| Entry {
                status: TaskStatus::pending(task.id.clone()),
                became_current_at: None,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TaskStatus> {
        self.entries.get(index).map(|e| &e.status)
    }

    /// Status at `index`. Panics when out of range, like slice indexing.
    pub fn status(&self, index: usize) -> &TaskStatus {
        &self.entries[index].status
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskStatus> {
        self.entries.iter().map(|e| &e.status)
    }

    pub fn index_of(&self, task_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.status.id == task_id)
    }

    /// Instant the task at `index` most recently became current.
    pub fn became_current_at(&self, index: usize) -> Option<Instant> {
        self.entries.get(index).and_then(|e| e.became_current_at)
    }

    /// Record that the task at `index` just became current.
    ///
    /// Pending tasks move to in-progress; every other status is left alone.
    /// Returns `true` when the status changed.
    pub fn enter(&mut self, index: usize, now: Instant) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        entry.became_current_at = Some(now);
        if entry.status.status == Status::Pending {
            entry.status.status = Status::InProgress;
            tracing::debug!(task = %entry.status.id, "task started");
            true
        } else {
            false
        }
    }

    /// Store a successful submission for the task at `index`.
    ///
    /// Time spent is only measured the first time a task is completed;
    /// later resubmissions replace the response but keep the original time.
    /// A reviewed task stays reviewed.
    pub fn commit_submission(
        &mut self,
        index: usize,
        response: EvaluationResponse,
        now: Instant,
    ) -> Option<&TaskStatus> {
        let entry = self.entries.get_mut(index)?;
        let first_completion = matches!(
            entry.status.status,
            Status::Pending | Status::InProgress
        );
        if first_completion {
            let started = entry.became_current_at.unwrap_or(now);
            entry.status.time_spent_secs = now.saturating_duration_since(started).as_secs();
        }
        if entry.status.status != Status::Reviewed {
            entry.status.status = Status::Completed;
        }
        entry.status.response = Some(response);
        tracing::info!(
            task = %entry.status.id,
            status = %entry.status.status,
            time_spent_secs = entry.status.time_spent_secs,
            "response stored"
        );
        Some(&entry.status)
    }

    /// Mark a completed task as reviewed.
    ///
    /// Annotation sessions never call this; it exists for a reviewing
    /// workflow layered on top of the same store.
    pub fn mark_reviewed(&mut self, task_id: &str) -> Result<(), SessionError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.status.id == task_id)
            .ok_or_else(|| SessionError::UnknownTask(task_id.to_string()))?;
        match entry.status.status {
            Status::Completed | Status::Reviewed => {
                entry.status.status = Status::Reviewed;
                Ok(())
            }
            status => Err(SessionError::NotCompleted {
                id: task_id.to_string(),
                status,
            }),
        }
    }

    /// First pending task strictly after `index`. Never wraps.
    pub fn first_pending_after(&self, index: usize) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .skip(index.saturating_add(1))
            .find(|(_, e)| e.status.status == Status::Pending)
            .map(|(i, _)| i)
    }

    pub fn count(&self, status: Status) -> usize {
        self.iter().filter(|s| s.status == status).count()
    }

    pub fn completed_count(&self) -> usize {
        self.count(Status::Completed)
    }

    /// Sum of recorded time across every task.
    pub fn total_time_secs(&self) -> u64 {
        self.iter().map(|s| s.time_spent_secs).sum()
    }
}
