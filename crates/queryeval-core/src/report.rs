//! Session report with JSON export.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{CatalogSummary, TaskStatus};
use crate::session::Session;
use crate::statistics::SessionStats;

/// A snapshot of a session's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// When the session started.
    pub session_started_at: DateTime<Utc>,
    /// Summary of the catalog.
    pub catalog: CatalogSummary,
    /// Who did the annotating, if known.
    #[serde(default)]
    pub annotator: Option<String>,
    /// One entry per task, in catalog order.
    pub records: Vec<TaskStatus>,
    /// Aggregate statistics.
    pub stats: SessionStats,
    /// Value of the session clock when the report was taken.
    pub session_elapsed_secs: u64,
}

impl SessionReport {
    pub fn from_session(session: &Session, annotator: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session_started_at: session.started_wall(),
            catalog: session.catalog().summary(),
            annotator,
            records: session.records().iter().cloned().collect(),
            stats: session.stats(),
            session_elapsed_secs: session.clock().elapsed_secs(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
