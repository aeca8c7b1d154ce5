//! Session and submission error types.
//!
//! `SubmitError` is defined here rather than in `queryeval-sinks` so the
//! session can record a failure without knowing which sink produced it.

use thiserror::Error;

use crate::model::Status;

/// Errors raised by session operations that would violate its contract.
///
/// None of these are fatal: the session is left exactly as it was before
/// the rejected call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// A session needs at least one task.
    #[error("catalog has no tasks")]
    EmptyCatalog,

    /// Two tasks in the catalog share an id.
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    /// Submit was attempted before all six criteria were answered.
    #[error("response is incomplete: {answered} of 6 criteria answered")]
    IncompleteResponse { answered: usize },

    /// Another submission has not resolved yet.
    #[error("a submission is already in progress")]
    SubmitInProgress,

    /// The pending submission does not match the one the session issued.
    #[error("stale submission for task {0}")]
    StaleSubmission(String),

    /// The task is in a state the requested transition cannot start from.
    #[error("task {id} is {status}, expected completed")]
    NotCompleted { id: String, status: Status },

    /// No task with this id exists in the catalog.
    #[error("unknown task: {0}")]
    UnknownTask(String),
}

/// Errors a submission sink can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The sink refused the response.
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// The sink could not be reached.
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// The sink did not answer in time.
    #[error("submission timed out after {0}ms")]
    Timeout(u64),

    /// An injected failure from a simulated sink.
    #[error("simulated failure on call {call}")]
    Simulated { call: u32 },
}

impl SubmitError {
    /// Message shown to the annotator when a submit fails.
    pub fn user_notice(&self) -> &'static str {
        "Submission Failed: Please try again."
    }
}
