//! queryeval configuration and sink factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use queryeval_core::engine::DriverConfig;
use queryeval_core::traits::SubmissionSink;

use crate::mock::MockSink;
use crate::simulated::SimulatedSink;

/// Where submitted responses go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Simulated {
        #[serde(default = "default_latency_ms")]
        latency_ms: u64,
        /// Fail every n-th submit.
        #[serde(default)]
        fail_every: Option<u32>,
        /// Fail this many submits at the start of the session.
        #[serde(default)]
        fail_first: u32,
    },
    Mock,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Simulated {
            latency_ms: default_latency_ms(),
            fail_every: None,
            fail_first: 0,
        }
    }
}

fn default_latency_ms() -> u64 {
    1000
}

/// Top-level queryeval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryevalConfig {
    /// Name recorded in session reports.
    #[serde(default)]
    pub annotator: Option<String>,
    /// Delay before moving to the next task after a successful submit.
    #[serde(default = "default_auto_advance")]
    pub auto_advance_delay_ms: u64,
    /// Session clock tick period.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Output directory for session reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Submission sink.
    #[serde(default)]
    pub sink: SinkConfig,
}

fn default_auto_advance() -> u64 {
    500
}
fn default_tick_interval() -> u64 {
    1000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./queryeval-sessions")
}

impl Default for QueryevalConfig {
    fn default() -> Self {
        Self {
            annotator: None,
            auto_advance_delay_ms: default_auto_advance(),
            tick_interval_ms: default_tick_interval(),
            output_dir: default_output_dir(),
            sink: SinkConfig::default(),
        }
    }
}

impl QueryevalConfig {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            auto_advance_delay: Duration::from_millis(self.auto_advance_delay_ms),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Override the simulated sink's latency. No effect on other sinks.
    pub fn set_latency_ms(&mut self, ms: u64) {
        if let SinkConfig::Simulated { latency_ms, .. } = &mut self.sink {
            *latency_ms = ms;
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `queryeval.toml` in the current directory
/// 2. `~/.config/queryeval/config.toml`
///
/// Environment variable overrides: `QUERYEVAL_ANNOTATOR`,
/// `QUERYEVAL_SUBMIT_LATENCY_MS`.
pub fn load_config() -> Result<QueryevalConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QueryevalConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("queryeval.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QueryevalConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => QueryevalConfig::default(),
    };

    // Apply env var overrides
    if let Ok(name) = std::env::var("QUERYEVAL_ANNOTATOR") {
        config.annotator = Some(name);
    }

    if let Ok(raw) = std::env::var("QUERYEVAL_SUBMIT_LATENCY_MS") {
        let ms: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("QUERYEVAL_SUBMIT_LATENCY_MS is not a number: {raw}"))?;
        config.set_latency_ms(ms);
    }

    config.annotator = config
        .annotator
        .as_deref()
        .map(resolve_env_vars)
        .filter(|a| !a.trim().is_empty());
    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("queryeval"))
}

/// Create a sink instance from its configuration.
pub fn create_sink(config: &SinkConfig) -> Arc<dyn SubmissionSink> {
    match config {
        SinkConfig::Simulated {
            latency_ms,
            fail_every,
            fail_first,
        } => Arc::new(
            SimulatedSink::new(Duration::from_millis(*latency_ms))
                .with_fail_every(*fail_every)
                .with_fail_first(*fail_first),
        ),
        SinkConfig::Mock => Arc::new(MockSink::new()),
    }
}
