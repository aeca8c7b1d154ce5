//! Trait definitions for the session's external collaborators.
//!
//! Task sources and submission sinks are implemented in `queryeval-core`
//! (TOML catalogs) and `queryeval-sinks`; observers are implemented by
//! whatever front end renders the session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;
use crate::model::{EvaluationResponse, TaskCatalog, TaskStatus};
use crate::session::SessionSnapshot;

// ---------------------------------------------------------------------------
// Task source
// ---------------------------------------------------------------------------

/// Supplies the ordered task catalog at session start.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn load(&self) -> anyhow::Result<TaskCatalog>;
}

/// A task source backed by a catalog that is already in memory.
pub struct StaticTaskSource {
    catalog: TaskCatalog,
}

impl StaticTaskSource {
    pub fn new(catalog: TaskCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl TaskSource for StaticTaskSource {
    async fn load(&self) -> anyhow::Result<TaskCatalog> {
        Ok(self.catalog.clone())
    }
}

// ---------------------------------------------------------------------------
// Submission sink
// ---------------------------------------------------------------------------

/// One response handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Task the response belongs to.
    pub task_id: String,
    /// The packaged, complete response.
    pub response: EvaluationResponse,
    /// Wall-clock time the submit was issued.
    pub submitted_at: DateTime<Utc>,
}

/// Acknowledgement returned by a sink on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub task_id: String,
    /// Round trip time in milliseconds.
    pub latency_ms: u64,
}

/// Destination for submitted responses.
///
/// Implementations own any timeout policy; the session waits for whatever
/// the sink returns.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Human-readable sink name (e.g. "simulated").
    fn name(&self) -> &str;

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmitError>;
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Receives session state for rendering.
pub trait SessionObserver: Send + Sync {
    fn on_state_change(&self, snapshot: &SessionSnapshot<'_>);
    fn on_submit_succeeded(&self, index: usize, status: &TaskStatus);
    fn on_submit_failed(&self, index: usize, error: &SubmitError);
    fn on_auto_advance(&self, from: usize, to: usize);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_state_change(&self, _: &SessionSnapshot<'_>) {}
    fn on_submit_succeeded(&self, _: usize, _: &TaskStatus) {}
    fn on_submit_failed(&self, _: usize, _: &SubmitError) {}
    fn on_auto_advance(&self, _: usize, _: usize) {}
}
