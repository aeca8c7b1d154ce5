//! The annotation session state machine.
//!
//! A [`Session`] owns the catalog, the record store, the current index and
//! the form being edited. Navigation and submission are methods on it; the
//! asynchronous half of a submit (talking to a sink, waiting out the
//! auto-advance delay) is driven from [`crate::engine`].
//!
//! Submission is split in two so the sink call can happen without holding
//! the session: [`Session::begin_submit`] validates and hands out a
//! [`PendingSubmission`], and [`Session::complete_submit`] applies the
//! sink's result. Only one submission may be outstanding at a time.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::clock::SessionClock;
use crate::criteria::Criterion;
use crate::error::{SessionError, SubmitError};
use crate::form::ResponseForm;
use crate::model::{EvaluationResponse, Task, TaskCatalog, TaskStatus};
use crate::records::RecordStore;
use crate::statistics::{completion_percent, SessionStats};
use crate::traits::{Submission, SubmissionReceipt};

/// A submit that has been issued but not yet resolved.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    ticket: u64,
    index: usize,
    submission: Submission,
}

impl PendingSubmission {
    /// Position of the submitted task.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }
}

/// What a resolved submission did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The response was stored. `advance_to` is the position the session
    /// should move to after the confirmation delay, if any.
    Committed {
        index: usize,
        status: TaskStatus,
        advance_to: Option<usize>,
    },
    /// The sink failed. Form and record store are unchanged.
    Failed { index: usize, error: SubmitError },
}

/// User-facing message raised by the last submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Submitted { index: usize },
    SubmitFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Submitted { index } => write!(
                f,
                "Evaluation Submitted: Task {} completed successfully.",
                index + 1
            ),
            Notice::SubmitFailed => write!(f, "Submission Failed: Please try again."),
        }
    }
}

/// Everything a front end needs to render the current state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot<'a> {
    pub index: usize,
    pub total: usize,
    pub task: &'a Task,
    pub status: &'a TaskStatus,
    pub form: &'a ResponseForm,
    /// `completed / total * 100`.
    pub completion_percent: f64,
    /// `answered / 6 * 100` for the current form.
    pub form_progress_percent: f64,
    pub can_previous: bool,
    pub can_next: bool,
    pub can_submit: bool,
    pub is_submitting: bool,
    pub elapsed_secs: u64,
    pub clock_running: bool,
    pub notice: Option<&'a Notice>,
}

/// One annotator's pass through a task catalog.
#[derive(Debug)]
pub struct Session {
    catalog: TaskCatalog,
    records: RecordStore,
    current: usize,
    form: ResponseForm,
    clock: SessionClock,
    started_at: Instant,
    started_wall: DateTime<Utc>,
    in_flight: Option<u64>,
    next_ticket: u64,
    notice: Option<Notice>,
}

impl Session {
    /// Start a session on the first task of `catalog`.
    ///
    /// Records are keyed by task id, so ids must be unique.
    pub fn new(catalog: TaskCatalog) -> Result<Self, SessionError> {
        if catalog.is_empty() {
            return Err(SessionError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = catalog.tasks.iter().find(|t| !seen.insert(t.id.as_str())) {
            return Err(SessionError::DuplicateTaskId(dup.id.clone()));
        }
        let started_at = Instant::now();
        let mut records = RecordStore::new(&catalog);
        records.enter(0, started_at);
        tracing::debug!(catalog = %catalog.id, tasks = catalog.len(), "session started");
        Ok(Self {
            catalog,
            records,
            current: 0,
            form: ResponseForm::new(),
            clock: SessionClock::new(),
            started_at,
            started_wall: Utc::now(),
            in_flight: None,
            next_ticket: 0,
            notice: None,
        })
    }

    /// The catalog this session walks, in annotation order.
    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    /// Per-task status, time and submitted response.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Mutable access for collaborators outside the annotation flow, such
    /// as a reviewer marking tasks reviewed.
    pub fn records_mut(&mut self) -> &mut RecordStore {
        &mut self.records
    }

    /// Session-wide display clock. Independent of per-task timing.
    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Monotonic instant the session was created.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Wall-clock time the session was created, for reports.
    pub fn started_wall(&self) -> DateTime<Utc> {
        self.started_wall
    }

    pub fn task_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_task(&self) -> &Task {
        &self.catalog.tasks[self.current]
    }

    pub fn current_status(&self) -> &TaskStatus {
        self.records.status(self.current)
    }

    /// Unsubmitted answers for the current task.
    pub fn form(&self) -> &ResponseForm {
        &self.form
    }

    /// Message raised by the most recent submission, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// True between `begin_submit` and the matching `complete_submit`.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn can_previous(&self) -> bool {
        self.current > 0
    }

    pub fn can_next(&self) -> bool {
        self.current + 1 < self.task_count()
    }

    /// Submit is enabled only with a complete form and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.form.is_complete() && !self.is_submitting()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Make the task at `index` current.
    ///
    /// Out-of-range indices and the current index are no-ops. Returns
    /// `true` when the current task changed.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.task_count() || index == self.current {
            return false;
        }
        self.current = index;
        self.records.enter(index, Instant::now());
        self.form = ResponseForm::from_existing(
            self.records.get(index).and_then(|s| s.response.as_ref()),
        );
        tracing::debug!(index, task = %self.current_task().id, "navigated");
        true
    }

    pub fn next(&mut self) -> bool {
        match self.current.checked_add(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    pub fn previous(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Move to the first pending task after the current one.
    ///
    /// In-progress tasks are skipped and the scan never wraps.
    pub fn jump_to_next_incomplete(&mut self) -> bool {
        match self.records.first_pending_after(self.current) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Form editing
    // -----------------------------------------------------------------------

    /// Set one criterion on the current form, overwriting any earlier answer.
    pub fn answer(&mut self, criterion: Criterion, value: bool) {
        self.form.set(criterion, value);
    }

    /// Return one criterion to unanswered.
    pub fn clear_answer(&mut self, criterion: Criterion) {
        self.form.clear(criterion);
    }

    /// Replace the comment. Kept as typed; trimmed only on submit.
    pub fn set_comments(&mut self, text: impl Into<String>) {
        self.form.set_comments(text);
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Package the current form for a sink.
    ///
    /// Rejected without touching any state if the form is incomplete or a
    /// submission is already outstanding.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SessionError> {
        if self.is_submitting() {
            return Err(SessionError::SubmitInProgress);
        }
        if !self.form.is_complete() {
            return Err(SessionError::IncompleteResponse {
                answered: self.form.answered_count(),
            });
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.notice = None;

        let task_id = self.current_task().id.clone();
        tracing::debug!(task = %task_id, ticket, "submit issued");
        Ok(PendingSubmission {
            ticket,
            index: self.current,
            submission: Submission {
                task_id,
                response: self.form.to_response(),
                submitted_at: Utc::now(),
            },
        })
    }

    /// Apply a sink's result to the submission issued by `begin_submit`.
    pub fn complete_submit(
        &mut self,
        pending: PendingSubmission,
        result: Result<SubmissionReceipt, SubmitError>,
    ) -> Result<SubmitOutcome, SessionError> {
        if self.in_flight != Some(pending.ticket) {
            return Err(SessionError::StaleSubmission(pending.submission.task_id));
        }
        self.in_flight = None;

        let PendingSubmission {
            index, submission, ..
        } = pending;

        match result {
            Ok(receipt) => {
                let status = self
                    .commit(index, submission.response)
                    .ok_or_else(|| SessionError::UnknownTask(submission.task_id.clone()))?;
                tracing::debug!(
                    task = %receipt.task_id,
                    latency_ms = receipt.latency_ms,
                    "submit acknowledged"
                );
                self.notice = Some(Notice::Submitted { index });
                let advance_to = (index + 1 < self.task_count()).then_some(index + 1);
                Ok(SubmitOutcome::Committed {
                    index,
                    status,
                    advance_to,
                })
            }
            Err(error) => {
                tracing::warn!(task = %submission.task_id, "submission failed: {error}");
                self.notice = Some(Notice::SubmitFailed);
                Ok(SubmitOutcome::Failed { index, error })
            }
        }
    }

    fn commit(&mut self, index: usize, response: EvaluationResponse) -> Option<TaskStatus> {
        self.records
            .commit_submission(index, response, Instant::now())
            .cloned()
    }

    /// Follow-up to a committed submit: step forward to `advance_to`.
    pub fn advance_after_submit(&mut self, advance_to: usize) -> bool {
        self.go_to(advance_to)
    }

    // -----------------------------------------------------------------------
    // Presentation
    // -----------------------------------------------------------------------

    /// Counts and averages over the record store.
    pub fn stats(&self) -> SessionStats {
        SessionStats::compute(&self.records)
    }

    /// Borrowed view of everything a front end renders.
    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            index: self.current,
            total: self.task_count(),
            task: self.current_task(),
            status: self.current_status(),
            form: &self.form,
            completion_percent: completion_percent(
                self.records.completed_count(),
                self.task_count(),
            ),
            form_progress_percent: self.form.progress_percent(),
            can_previous: self.can_previous(),
            can_next: self.can_next(),
            can_submit: self.can_submit(),
            is_submitting: self.is_submitting(),
            elapsed_secs: self.clock.elapsed_secs(),
            clock_running: self.clock.is_running(),
            notice: self.notice.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use std::time::Duration;

    fn catalog(n: usize) -> TaskCatalog {
        let tasks = (0..n)
            .map(|i| Task::new(format!("task_{i:03}"), format!("query {i}")))
            .collect();
        TaskCatalog::new("test", "Test", tasks)
    }

    fn answer_all(session: &mut Session) {
        for c in Criterion::ALL {
            session.answer(c, c == Criterion::InfoSeeking);
        }
    }

    fn receipt(session: &Session) -> Result<SubmissionReceipt, SubmitError> {
        Ok(SubmissionReceipt {
            task_id: session.current_task().id.clone(),
            latency_ms: 0,
        })
    }

    fn status_at(session: &Session, index: usize) -> Status {
        session.records().get(index).unwrap().status
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let err = Session::new(catalog(0)).unwrap_err();
        assert_eq!(err, SessionError::EmptyCatalog);
    }

    #[test]
    fn duplicate_task_ids_are_rejected() {
        let catalog = TaskCatalog::new(
            "dup",
            "Dup",
            vec![
                Task::new("task_001", "When is the Grammy Awards?"),
                Task::new("task_002", "ai news today"),
                Task::new("task_001", "Taylor Swift concert tickets"),
            ],
        );
        let err = Session::new(catalog).unwrap_err();
        assert_eq!(err, SessionError::DuplicateTaskId("task_001".into()));
    }

    #[test]
    fn reviewed_task_stays_reviewed_after_resubmit() {
        let mut session = Session::new(catalog(2)).unwrap();
        answer_all(&mut session);
        let pending = session.begin_submit().unwrap();
        let result = receipt(&session);
        session.complete_submit(pending, result).unwrap();
        session.records_mut().mark_reviewed("task_000").unwrap();

        session.next();
        session.previous();
        assert!(session.form().is_complete());
        session.answer(Criterion::Trending, true);
        let pending = session.begin_submit().unwrap();
        let result = receipt(&session);
        let outcome = session.complete_submit(pending, result).unwrap();

        let SubmitOutcome::Committed { status, .. } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(status.status, Status::Reviewed);
        assert_eq!(status_at(&session, 0), Status::Reviewed);
        assert_eq!(
            session.records().status(0).response.as_ref().unwrap().is_trending,
            Some(true)
        );
        assert_eq!(session.stats().reviewed, 1);
        assert_eq!(session.stats().completed, 0);
    }

    #[test]
    fn first_task_starts_in_progress() {
        let session = Session::new(catalog(3)).unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(status_at(&session, 0), Status::InProgress);
        assert_eq!(status_at(&session, 1), Status::Pending);
        assert!(!session.can_previous());
        assert!(session.can_next());
    }

    #[test]
    fn go_to_selects_catalog_position() {
        let mut session = Session::new(catalog(5)).unwrap();
        for i in [3, 1, 4, 0, 2] {
            session.go_to(i);
            assert_eq!(session.current_index(), i);
            assert_eq!(session.current_task().id, format!("task_{i:03}"));
        }
        assert!(!session.go_to(5));
        assert!(!session.go_to(usize::MAX));
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn next_and_previous_stop_at_bounds() {
        let mut session = Session::new(catalog(2)).unwrap();
        assert!(!session.previous());
        assert_eq!(session.current_index(), 0);
        assert!(session.next());
        assert!(!session.next());
        assert_eq!(session.current_index(), 1);
        assert!(!session.can_next());
        assert!(session.previous());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn visited_tasks_never_return_to_pending() {
        let mut session = Session::new(catalog(4)).unwrap();
        for i in [2, 0, 3, 2, 1, 0] {
            session.go_to(i);
        }
        assert!(session
            .records()
            .iter()
            .all(|s| s.status == Status::InProgress));
    }

    #[test]
    fn jump_skips_in_progress_and_never_wraps() {
        let mut session = Session::new(catalog(5)).unwrap();
        session.go_to(2);
        session.go_to(0);
        assert!(session.jump_to_next_incomplete());
        assert_eq!(session.current_index(), 1);
        assert!(session.jump_to_next_incomplete());
        assert_eq!(session.current_index(), 3);
        assert!(session.jump_to_next_incomplete());
        assert_eq!(session.current_index(), 4);
        assert!(!session.jump_to_next_incomplete());
        assert_eq!(session.current_index(), 4);
    }

    #[test]
    fn jump_ignores_pending_tasks_behind() {
        let mut session = Session::new(catalog(4)).unwrap();
        session.go_to(3);
        assert_eq!(status_at(&session, 1), Status::Pending);
        assert!(!session.jump_to_next_incomplete());
        assert_eq!(session.current_index(), 3);
    }

    #[test]
    fn incomplete_submit_is_rejected_without_mutation() {
        let mut session = Session::new(catalog(2)).unwrap();
        session.answer(Criterion::Intelligible, true);
        session.answer(Criterion::Trending, false);

        let err = session.begin_submit().unwrap_err();
        assert_eq!(err, SessionError::IncompleteResponse { answered: 2 });
        assert!(!session.is_submitting());
        assert_eq!(status_at(&session, 0), Status::InProgress);
        assert!(session.records().get(0).unwrap().response.is_none());
        assert_eq!(session.form().answered_count(), 2);
    }

    #[test]
    fn second_submit_while_in_flight_is_rejected() {
        let mut session = Session::new(catalog(2)).unwrap();
        answer_all(&mut session);
        let pending = session.begin_submit().unwrap();
        assert!(!session.can_submit());
        assert_eq!(
            session.begin_submit().unwrap_err(),
            SessionError::SubmitInProgress
        );
        let result = receipt(&session);
        session.complete_submit(pending, result).unwrap();
        assert!(!session.is_submitting());
    }

    #[test]
    fn stale_submission_is_rejected() {
        let mut session = Session::new(catalog(2)).unwrap();
        answer_all(&mut session);
        let pending = session.begin_submit().unwrap();
        let copy = pending.clone();
        let result = receipt(&session);
        session.complete_submit(pending, result.clone()).unwrap();
        assert!(matches!(
            session.complete_submit(copy, result),
            Err(SessionError::StaleSubmission(_))
        ));
    }

    #[test]
    fn comments_are_trimmed_on_submit() {
        let mut session = Session::new(catalog(1)).unwrap();
        answer_all(&mut session);
        session.set_comments("   ");
        let pending = session.begin_submit().unwrap();
        assert_eq!(pending.submission().response.comments, None);
        assert_eq!(pending.submission().task_id, "task_000");
    }

    #[tokio::test(start_paused = true)]
    async fn commit_records_time_and_schedules_advance() {
        let mut session = Session::new(catalog(3)).unwrap();
        answer_all(&mut session);
        tokio::time::advance(Duration::from_secs(12)).await;

        let pending = session.begin_submit().unwrap();
        let result = receipt(&session);
        let outcome = session.complete_submit(pending, result).unwrap();

        match outcome {
            SubmitOutcome::Committed {
                index,
                status,
                advance_to,
            } => {
                assert_eq!(index, 0);
                assert_eq!(status.status, Status::Completed);
                assert_eq!(status.time_spent_secs, 12);
                assert_eq!(advance_to, Some(1));
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert_eq!(
            session.notice().unwrap().to_string(),
            "Evaluation Submitted: Task 1 completed successfully."
        );
    }

    #[test]
    fn last_task_does_not_advance() {
        let mut session = Session::new(catalog(2)).unwrap();
        session.go_to(1);
        answer_all(&mut session);
        let pending = session.begin_submit().unwrap();
        let result = receipt(&session);
        let outcome = session.complete_submit(pending, result).unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Committed {
                advance_to: None,
                ..
            }
        ));
    }

    #[test]
    fn failed_submit_keeps_form_and_status() {
        let mut session = Session::new(catalog(2)).unwrap();
        answer_all(&mut session);
        session.set_comments("needs a second look");

        let pending = session.begin_submit().unwrap();
        let outcome = session
            .complete_submit(pending, Err(SubmitError::Simulated { call: 1 }))
            .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Failed { index: 0, .. }));
        assert_eq!(status_at(&session, 0), Status::InProgress);
        assert!(session.records().get(0).unwrap().response.is_none());
        assert!(session.form().is_complete());
        assert_eq!(session.form().comments(), "needs a second look");
        assert!(session.can_submit());
        assert_eq!(session.notice(), Some(&Notice::SubmitFailed));
    }

    #[test]
    fn advance_moves_exactly_one_step_even_onto_completed() {
        let mut session = Session::new(catalog(3)).unwrap();
        session.go_to(1);
        answer_all(&mut session);
        let pending = session.begin_submit().unwrap();
        let result = receipt(&session);
        session.complete_submit(pending, result).unwrap();

        session.go_to(0);
        answer_all(&mut session);
        let pending = session.begin_submit().unwrap();
        let result = receipt(&session);
        let outcome = session.complete_submit(pending, result).unwrap();
        let SubmitOutcome::Committed {
            advance_to: Some(target),
            ..
        } = outcome
        else {
            panic!("expected an advance target");
        };
        assert!(session.advance_after_submit(target));
        assert_eq!(session.current_index(), 1);
        assert_eq!(status_at(&session, 1), Status::Completed);
    }

    #[test]
    fn revisiting_completed_task_prefills_form() {
        let mut session = Session::new(catalog(2)).unwrap();
        answer_all(&mut session);
        session.set_comments("ok");
        let pending = session.begin_submit().unwrap();
        let result = receipt(&session);
        session.complete_submit(pending, result).unwrap();

        session.next();
        assert_eq!(session.form().answered_count(), 0);
        session.previous();
        assert!(session.form().is_complete());
        assert_eq!(session.form().comments(), "ok");
        assert_eq!(status_at(&session, 0), Status::Completed);
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut session = Session::new(catalog(4)).unwrap();
        session.answer(Criterion::Intelligible, true);
        session.answer(Criterion::InfoSeeking, true);
        session.answer(Criterion::Ambiguous, false);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.index, 0);
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.task.id, "task_000");
        assert_eq!(snapshot.status.status, Status::InProgress);
        assert_eq!(snapshot.completion_percent, 0.0);
        assert!((snapshot.form_progress_percent - 50.0).abs() < f64::EPSILON);
        assert!(!snapshot.can_submit);
        assert!(snapshot.clock_running);
    }

    #[test]
    fn independent_sessions_do_not_interfere() {
        let mut a = Session::new(catalog(3)).unwrap();
        let b = Session::new(catalog(3)).unwrap();
        a.go_to(2);
        a.clock().pause();
        assert_eq!(b.current_index(), 0);
        assert!(b.clock().is_running());
        assert_eq!(b.records().get(2).unwrap().status, Status::Pending);
    }
}
