//! Simulated remote sink.
//!
//! Stands in for a real submission endpoint: every call waits out a fixed
//! latency before answering. Failures can be injected deterministically so
//! the retry path can be exercised by hand.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use queryeval_core::error::SubmitError;
use queryeval_core::traits::{Submission, SubmissionReceipt, SubmissionSink};

/// Default round trip for a simulated submit.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

pub struct SimulatedSink {
    latency: Duration,
    /// Fail every n-th call (1-based). `None` disables.
    fail_every: Option<u32>,
    /// Fail this many calls before anything else is considered.
    fail_first: u32,
    call_count: AtomicU32,
}

impl Default for SimulatedSink {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

impl SimulatedSink {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            fail_every: None,
            fail_first: 0,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn with_fail_every(mut self, n: Option<u32>) -> Self {
        self.fail_every = n.filter(|n| *n > 0);
        self
    }

    pub fn with_fail_first(mut self, n: u32) -> Self {
        self.fail_first = n;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn should_fail(&self, call: u32) -> bool {
        call <= self.fail_first || self.fail_every.is_some_and(|n| call % n == 0)
    }
}

#[async_trait]
impl SubmissionSink for SimulatedSink {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmitError> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            task = %submission.task_id,
            call,
            latency_ms = self.latency.as_millis() as u64,
            "simulated submit"
        );

        tokio::time::sleep(self.latency).await;

        if self.should_fail(call) {
            tracing::warn!(task = %submission.task_id, call, "injected submit failure");
            return Err(SubmitError::Simulated { call });
        }

        Ok(SubmissionReceipt {
            task_id: submission.task_id.clone(),
            latency_ms: self.latency.as_millis() as u64,
        })
    }
}
