//! TOML task catalog parser.
//!
//! Loads task catalogs from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::{Task, TaskCatalog};
use crate::traits::TaskSource;

/// Format expected for `reference_date`.
pub const REFERENCE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    tasks: Vec<TomlTask>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlTask {
    id: String,
    query: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    interaction_history: Vec<String>,
    #[serde(default)]
    reference_date: Option<String>,
}

/// Parse a single TOML file into a `TaskCatalog`.
pub fn parse_catalog(path: &Path) -> Result<TaskCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `TaskCatalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<TaskCatalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let tasks = parsed
        .tasks
        .into_iter()
        .map(|t| Task {
            id: t.id,
            query: t.query,
            context: t.context.filter(|c| !c.trim().is_empty()),
            interaction_history: t.interaction_history,
            reference_date: t.reference_date,
        })
        .collect();

    Ok(TaskCatalog {
        id: parsed.catalog.id,
        name: parsed.catalog.name,
        description: parsed.catalog.description,
        tasks,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<TaskCatalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// Load either one catalog file or every catalog under a directory.
pub fn load_catalogs(path: &Path) -> Result<Vec<TaskCatalog>> {
    if path.is_dir() {
        load_catalog_directory(path)
    } else {
        Ok(vec![parse_catalog(path)?])
    }
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The task ID (if applicable).
    pub task_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a catalog for common issues.
pub fn validate_catalog(catalog: &TaskCatalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if catalog.tasks.is_empty() {
        warnings.push(ValidationWarning {
            task_id: None,
            message: "catalog has no tasks".into(),
        });
    }

    // Check for duplicate task IDs
    let mut seen_ids = HashSet::new();
    for task in &catalog.tasks {
        if !seen_ids.insert(&task.id) {
            warnings.push(ValidationWarning {
                task_id: Some(task.id.clone()),
                message: format!("duplicate task ID: {}", task.id),
            });
        }
    }

    for task in &catalog.tasks {
        if task.query.trim().is_empty() {
            warnings.push(ValidationWarning {
                task_id: Some(task.id.clone()),
                message: "query is empty".into(),
            });
        }

        if let Some(pos) = task
            .interaction_history
            .iter()
            .position(|line| line.trim().is_empty())
        {
            warnings.push(ValidationWarning {
                task_id: Some(task.id.clone()),
                message: format!("interaction_history line {} is blank", pos + 1),
            });
        }

        if let Some(date) = &task.reference_date {
            if NaiveDate::parse_from_str(date, REFERENCE_DATE_FORMAT).is_err() {
                warnings.push(ValidationWarning {
                    task_id: Some(task.id.clone()),
                    message: format!("reference_date '{date}' is not YYYY-MM-DD"),
                });
            }
        }
    }

    warnings
}

/// Task source reading a single TOML catalog file.
pub struct TomlTaskSource {
    path: PathBuf,
}

impl TomlTaskSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TaskSource for TomlTaskSource {
    async fn load(&self) -> Result<TaskCatalog> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read catalog file: {}", self.path.display()))?;
        parse_catalog_str(&content, &self.path)
    }
}
