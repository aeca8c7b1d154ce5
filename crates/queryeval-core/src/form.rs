//! Per-task answer form.

use crate::criteria::Criterion;
use crate::model::EvaluationResponse;

/// Answers being edited for the current task, not yet submitted.
///
/// Edits overwrite in place. The comment is kept exactly as typed until
/// [`ResponseForm::to_response`] packages it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseForm {
    answers: EvaluationResponse,
    comments: String,
}

impl ResponseForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled from a previously submitted response.
    pub fn from_existing(existing: Option<&EvaluationResponse>) -> Self {
        match existing {
            Some(response) => {
                let mut answers = response.clone();
                let comments = answers.comments.take().unwrap_or_default();
                Self { answers, comments }
            }
            None => Self::default(),
        }
    }

    pub fn set(&mut self, criterion: Criterion, value: bool) {
        self.answers.set(criterion, value);
    }

    pub fn clear(&mut self, criterion: Criterion) {
        self.answers.clear(criterion);
    }

    pub fn get(&self, criterion: Criterion) -> Option<bool> {
        self.answers.get(criterion)
    }

    pub fn set_comments(&mut self, text: impl Into<String>) {
        self.comments = text.into();
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn answered_count(&self) -> usize {
        self.answers.answered_count()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.is_complete()
    }

    /// Share of criteria answered, 0.0 to 100.0.
    pub fn progress_percent(&self) -> f64 {
        self.answered_count() as f64 / Criterion::COUNT as f64 * 100.0
    }

    /// Package the answers for submission. Blank comments become `None`.
    pub fn to_response(&self) -> EvaluationResponse {
        let trimmed = self.comments.trim();
        EvaluationResponse {
            comments: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            ..self.answers.clone()
        }
    }
}
