//! Session driver.
//!
//! Runs the asynchronous half of a submit: hands the packaged response to
//! a sink, applies the result to the session, and performs the delayed
//! auto-advance after a successful commit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::SessionError;
use crate::session::{Session, SubmitOutcome};
use crate::traits::{SessionObserver, SubmissionSink};

/// Configuration for the session driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Pause between a successful commit and moving to the next task, so
    /// the confirmation stays visible.
    pub auto_advance_delay: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay: Duration::from_millis(500),
        }
    }
}

/// Connects a [`Session`] to a submission sink and an observer.
pub struct SessionDriver {
    sink: Arc<dyn SubmissionSink>,
    observer: Arc<dyn SessionObserver>,
    config: DriverConfig,
}

impl SessionDriver {
    pub fn new(
        sink: Arc<dyn SubmissionSink>,
        observer: Arc<dyn SessionObserver>,
        config: DriverConfig,
    ) -> Self {
        Self {
            sink,
            observer,
            config,
        }
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Tell the observer about the session's current state.
    pub fn publish(&self, session: &Session) {
        self.observer.on_state_change(&session.snapshot());
    }

    /// Submit the current form.
    ///
    /// Incomplete forms and overlapping submits are rejected before the
    /// sink is called. A sink failure is not an `Err`: it comes back as
    /// [`SubmitOutcome::Failed`] with the session left as it was.
    pub async fn submit(&self, session: &mut Session) -> Result<SubmitOutcome, SessionError> {
        let pending = session.begin_submit()?;
        self.publish(session);

        let start = Instant::now();
        let result = self.sink.submit(pending.submission()).await;
        tracing::debug!(
            sink = self.sink.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "sink returned"
        );

        let outcome = session.complete_submit(pending, result)?;
        match &outcome {
            SubmitOutcome::Committed { index, status, .. } => {
                self.observer.on_submit_succeeded(*index, status);
            }
            SubmitOutcome::Failed { index, error } => {
                self.observer.on_submit_failed(*index, error);
            }
        }
        self.publish(session);

        // The commit is already visible; the advance is a separate step.
        if let SubmitOutcome::Committed {
            index,
            advance_to: Some(target),
            ..
        } = &outcome
        {
            tokio::time::sleep(self.config.auto_advance_delay).await;
            if session.advance_after_submit(*target) {
                self.observer.on_auto_advance(*index, *target);
                self.publish(session);
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::criteria::Criterion;
    use crate::error::SubmitError;
    use crate::model::{Status, Task, TaskCatalog, TaskStatus};
    use crate::session::SessionSnapshot;
    use crate::traits::{NoopObserver, Submission, SubmissionReceipt};

    /// Sink that fails the first `failures` calls after sleeping `latency`.
    struct FlakySink {
        latency: Duration,
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl SubmissionSink for FlakySink {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmitError> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
            tokio::time::sleep(self.latency).await;
            if call <= self.failures {
                return Err(SubmitError::Simulated { call });
            }
            Ok(SubmissionReceipt {
                task_id: submission.task_id.clone(),
                latency_ms: self.latency.as_millis() as u64,
            })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl SessionObserver for RecordingObserver {
        fn on_state_change(&self, _: &SessionSnapshot<'_>) {}
        fn on_submit_succeeded(&self, index: usize, status: &TaskStatus) {
            self.events
                .lock()
                .unwrap()
                .push(format!("ok {index} {}", status.status));
        }
        fn on_submit_failed(&self, index: usize, _: &SubmitError) {
            self.events.lock().unwrap().push(format!("fail {index}"));
        }
        fn on_auto_advance(&self, from: usize, to: usize) {
            self.events.lock().unwrap().push(format!("advance {from}->{to}"));
        }
    }

    fn abc() -> TaskCatalog {
        TaskCatalog::new(
            "abc",
            "ABC",
            vec![
                Task::new("A", "When is the Grammy Awards?"),
                Task::new("B", "What happened to Silicon Valley Bank?"),
                Task::new("C", "ai news today"),
            ],
        )
    }

    fn answer_all(session: &mut Session) {
        for c in Criterion::ALL {
            session.answer(c, true);
        }
    }

    fn driver(failures: u32, observer: Arc<dyn SessionObserver>) -> SessionDriver {
        let sink = Arc::new(FlakySink {
            latency: Duration::from_secs(1),
            failures,
            calls: AtomicU32::new(0),
        });
        SessionDriver::new(sink, observer, DriverConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_form_never_reaches_sink() {
        let sink = Arc::new(FlakySink {
            latency: Duration::ZERO,
            failures: 0,
            calls: AtomicU32::new(0),
        });
        let driver = SessionDriver::new(sink.clone(), Arc::new(NoopObserver), DriverConfig::default());
        let mut session = Session::new(abc()).unwrap();
        session.answer(Criterion::Intelligible, true);

        let err = driver.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, SessionError::IncompleteResponse { answered: 1 }));
        assert_eq!(sink.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn observer_sees_failure_commit_and_advance() {
        let observer = Arc::new(RecordingObserver::default());
        let driver = driver(1, observer.clone());
        let mut session = Session::new(abc()).unwrap();

        answer_all(&mut session);
        tokio::time::advance(Duration::from_secs(11)).await;
        let outcome = driver.submit(&mut session).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed { index: 0, .. }));
        assert_eq!(session.records().status(0).status, Status::InProgress);
        assert!(!session.is_submitting());

        let outcome = driver.submit(&mut session).await.unwrap();
        let SubmitOutcome::Committed { status, .. } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(status.status, Status::Completed);
        assert_eq!(status.time_spent_secs, 13);
        assert_eq!(session.current_index(), 1);

        let events = observer.events.lock().unwrap().clone();
        assert_eq!(events, vec!["fail 0", "ok 0 completed", "advance 0->1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_from_three_tasks() {
        let mut session = Session::new(abc()).unwrap();
        let ok = driver(0, Arc::new(NoopObserver));

        // A: submit lands at +12s (11s thinking + 1s sink latency).
        answer_all(&mut session);
        tokio::time::advance(Duration::from_secs(11)).await;
        let outcome = ok.submit(&mut session).await.unwrap();
        let SubmitOutcome::Committed { status, advance_to, .. } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(status.time_spent_secs, 12);
        assert_eq!(advance_to, Some(1));

        // Auto-advance to B.
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.records().status(1).status, Status::InProgress);

        // B: one failed submit keeps its answers.
        let flaky = driver(1, Arc::new(NoopObserver));
        answer_all(&mut session);
        session.set_comments("bank collapse, March 2023");
        let outcome = flaky.submit(&mut session).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed { index: 1, .. }));
        assert_eq!(session.records().status(1).status, Status::InProgress);
        assert!(session.form().is_complete());
        assert_eq!(session.form().comments(), "bank collapse, March 2023");
        assert_eq!(session.current_index(), 1);

        // Resubmit succeeds. Resolve it directly so C is still pending
        // when we look for the next incomplete task.
        let pending = session.begin_submit().unwrap();
        let receipt = SubmissionReceipt {
            task_id: "B".into(),
            latency_ms: 0,
        };
        let outcome = session.complete_submit(pending, Ok(receipt)).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Committed { index: 1, .. }));
        assert_eq!(session.records().status(1).status, Status::Completed);
        assert_eq!(
            session.records().status(1).response.as_ref().unwrap().comments.as_deref(),
            Some("bank collapse, March 2023")
        );

        assert!(session.jump_to_next_incomplete());
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.current_task().id, "C");
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advance_waits_for_delay() {
        let sink = Arc::new(FlakySink {
            latency: Duration::ZERO,
            failures: 0,
            calls: AtomicU32::new(0),
        });
        let driver = SessionDriver::new(
            sink,
            Arc::new(NoopObserver),
            DriverConfig {
                auto_advance_delay: Duration::from_millis(500),
            },
        );
        let mut session = Session::new(abc()).unwrap();
        answer_all(&mut session);

        let before = tokio::time::Instant::now();
        driver.submit(&mut session).await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(500));
        assert_eq!(session.current_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_keeps_time_status_and_single_step_advance() {
        let driver = driver(0, Arc::new(NoopObserver));
        let mut session = Session::new(abc()).unwrap();

        // A completes at +5s (4s thinking + 1s sink latency).
        answer_all(&mut session);
        tokio::time::advance(Duration::from_secs(4)).await;
        driver.submit(&mut session).await.unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.records().status(0).time_spent_secs, 5);

        // Back to A much later: answers are prefilled, one is changed.
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(session.previous());
        assert_eq!(session.records().status(0).status, Status::Completed);
        session.answer(Criterion::Ambiguous, false);
        let outcome = driver.submit(&mut session).await.unwrap();

        let SubmitOutcome::Committed {
            index,
            status,
            advance_to,
        } = outcome
        else {
            panic!("expected commit");
        };
        assert_eq!(index, 0);
        assert_eq!(status.status, Status::Completed);
        assert_eq!(status.time_spent_secs, 5);
        assert_eq!(advance_to, Some(1));
        assert_eq!(session.current_index(), 1);
        assert_eq!(
            session.records().status(0).response.as_ref().unwrap().is_ambiguous,
            Some(false)
        );

        // A reviewed task keeps its status through the same path.
        session.records_mut().mark_reviewed("A").unwrap();
        assert!(session.previous());
        let outcome = driver.submit(&mut session).await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Committed { index: 0, ref status, .. }
                if status.status == Status::Reviewed && status.time_spent_secs == 5
        ));
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.stats().completed, 0);
        assert_eq!(session.stats().reviewed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn last_task_stays_put() {
        let driver = driver(0, Arc::new(NoopObserver));
        let mut session = Session::new(abc()).unwrap();
        session.go_to(2);
        answer_all(&mut session);
        let outcome = driver.submit(&mut session).await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Committed {
                index: 2,
                advance_to: None,
                ..
            }
        ));
        assert_eq!(session.current_index(), 2);
    }
}
