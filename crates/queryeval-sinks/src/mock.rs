//! Mock sink for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use queryeval_core::error::SubmitError;
use queryeval_core::traits::{Submission, SubmissionReceipt, SubmissionSink};

/// A sink that keeps every accepted submission in memory.
///
/// Returns immediately. Can be told to fail its next few calls.
pub struct MockSink {
    /// Accepted submissions, oldest first.
    accepted: Mutex<Vec<Submission>>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Calls still to fail.
    fail_remaining: AtomicU32,
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            accepted: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
            fail_remaining: AtomicU32::new(0),
        }
    }

    /// Create a mock whose first `n` calls fail.
    pub fn failing_first(n: u32) -> Self {
        let sink = Self::new();
        sink.fail_next(n);
        sink
    }

    /// Make the next `n` calls fail.
    pub fn fail_next(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::Relaxed);
    }

    /// Get the number of calls made to this sink.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Submissions accepted so far.
    pub fn accepted(&self) -> Vec<Submission> {
        self.accepted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Get the last accepted submission.
    pub fn last_submission(&self) -> Option<Submission> {
        self.accepted().pop()
    }
}

#[async_trait]
impl SubmissionSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmitError> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;

        let should_fail = self
            .fail_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(SubmitError::Simulated { call });
        }

        self.accepted
            .lock()
            .map_err(|_| SubmitError::Unavailable("mock sink poisoned".into()))?
            .push(submission.clone());

        Ok(SubmissionReceipt {
            task_id: submission.task_id.clone(),
            latency_ms: 0,
        })
    }
}
