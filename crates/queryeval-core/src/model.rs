//! Core data model types for queryeval.
//!
//! These are the fundamental types used to represent tasks, annotator
//! responses, and per-task status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::criteria::Criterion;

/// A single query to be evaluated by an annotator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for this task.
    pub id: String,
    /// The query text under evaluation.
    pub query: String,
    /// Free-form context shown alongside the query (e.g. a timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Prior conversation turns, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interaction_history: Vec<String>,
    /// Date the query should be judged against, if it differs from today.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            context: None,
            interaction_history: Vec::new(),
            reference_date: None,
        }
    }
}

/// An ordered, read-only collection of tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCatalog {
    /// Unique identifier for this catalog.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of this catalog.
    #[serde(default)]
    pub description: String,
    /// The tasks, in annotation order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskCatalog {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tasks,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            task_count: self.tasks.len(),
        }
    }
}

/// Summary of a catalog (without the task bodies).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub id: String,
    pub name: String,
    pub task_count: usize,
}

/// An annotator's answers for one task.
///
/// Each judgment is three-valued: unset, yes, or no. An unset judgment is
/// never treated as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_intelligible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_info_seeking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ambiguous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_time_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_trending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_harmful_intent: Option<bool>,
    /// Optional free-text notes. Never blank when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl EvaluationResponse {
    pub fn get(&self, criterion: Criterion) -> Option<bool> {
        match criterion {
            Criterion::Intelligible => self.is_intelligible,
            Criterion::InfoSeeking => self.is_info_seeking,
            Criterion::Ambiguous => self.is_ambiguous,
            Criterion::TimeSensitive => self.is_time_sensitive,
            Criterion::Trending => self.is_trending,
            Criterion::HarmfulIntent => self.has_harmful_intent,
        }
    }

    fn slot(&mut self, criterion: Criterion) -> &mut Option<bool> {
        match criterion {
            Criterion::Intelligible => &mut self.is_intelligible,
            Criterion::InfoSeeking => &mut self.is_info_seeking,
            Criterion::Ambiguous => &mut self.is_ambiguous,
            Criterion::TimeSensitive => &mut self.is_time_sensitive,
            Criterion::Trending => &mut self.is_trending,
            Criterion::HarmfulIntent => &mut self.has_harmful_intent,
        }
    }

    pub fn set(&mut self, criterion: Criterion, value: bool) {
        *self.slot(criterion) = Some(value);
    }

    pub fn clear(&mut self, criterion: Criterion) {
        *self.slot(criterion) = None;
    }

    /// Number of criteria that have an answer.
    pub fn answered_count(&self) -> usize {
        Criterion::ALL
            .iter()
            .filter(|c| self.get(**c).is_some())
            .count()
    }

    /// True when every criterion is answered. Comments do not count.
    pub fn is_complete(&self) -> bool {
        self.answered_count() == Criterion::COUNT
    }

    /// Criteria still waiting for an answer, in presentation order.
    pub fn unanswered(&self) -> Vec<Criterion> {
        Criterion::ALL
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_none())
            .collect()
    }
}

/// Lifecycle state of a task within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Set only by an external reviewer; nothing in an annotation session
    /// produces it.
    Reviewed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::InProgress => write!(f, "in_progress"),
            Status::Completed => write!(f, "completed"),
            Status::Reviewed => write!(f, "reviewed"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "reviewed" => Ok(Status::Reviewed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Per-task bookkeeping kept by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Id of the task this status belongs to.
    pub id: String,
    pub status: Status,
    /// Whole seconds between the task becoming current and its submission.
    #[serde(default)]
    pub time_spent_secs: u64,
    /// The submitted response, once there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<EvaluationResponse>,
}

impl TaskStatus {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: Status::Pending,
            time_spent_secs: 0,
            response: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_and_parse() {
        assert_eq!(Status::InProgress.to_string(), "in_progress");
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("Reviewed".parse::<Status>().unwrap(), Status::Reviewed);
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn unset_is_not_false() {
        let mut response = EvaluationResponse::default();
        assert_eq!(response.get(Criterion::Ambiguous), None);
        response.set(Criterion::Ambiguous, false);
        assert_eq!(response.get(Criterion::Ambiguous), Some(false));
        assert_eq!(response.answered_count(), 1);
        response.clear(Criterion::Ambiguous);
        assert_eq!(response.answered_count(), 0);
    }

    #[test]
    fn completeness_ignores_comments() {
        let mut response = EvaluationResponse {
            comments: Some("looks spammy".into()),
            ..Default::default()
        };
        assert!(!response.is_complete());
        for c in Criterion::ALL {
            response.set(c, false);
        }
        assert!(response.is_complete());
        assert!(response.unanswered().is_empty());
    }

    #[test]
    fn response_serializes_with_original_field_names() {
        let mut response = EvaluationResponse::default();
        response.set(Criterion::HarmfulIntent, true);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["has_harmful_intent"], true);
        assert!(json.get("is_intelligible").is_none());
    }

    #[test]
    fn task_deserializes_without_optional_fields() {
        let task: Task = serde_json::from_str(r#"{"id":"t1","query":"ai news today"}"#).unwrap();
        assert_eq!(task.id, "t1");
        assert!(task.context.is_none());
        assert!(task.interaction_history.is_empty());
    }
}
