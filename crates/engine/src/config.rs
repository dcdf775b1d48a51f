// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use crate::command::ModelMap;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// What the manager does at startup with jobs already marked `running`
/// that it is not tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleRunningPolicy {
    /// Leave them alone. They are never resumed or retried.
    #[default]
    Leave,
    /// Mark them `error` once, before the first scan.
    MarkError,
}

impl FromStr for StaleRunningPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leave" => Ok(StaleRunningPolicy::Leave),
            "error" | "mark_error" => Ok(StaleRunningPolicy::MarkError),
            other => Err(format!(
                "unknown stale-running policy: {other} (expected leave or error)"
            )),
        }
    }
}

/// Settings for a single job execution.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub model_map: ModelMap,
    /// Model used when the status record names none
    pub default_model: String,
    pub pdflatex_command: String,
    pub pdflatex_args: Vec<String>,
    /// Total compiler runs when the first one succeeds
    pub pdflatex_runs: u32,
    pub pdf_timeout: Duration,
    /// Time between SIGTERM and SIGKILL when stopping an agent
    pub terminate_grace: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            model_map: ModelMap::default(),
            default_model: "claude-opus-4".to_string(),
            pdflatex_command: "pdflatex".to_string(),
            pdflatex_args: vec!["-interaction=nonstopmode".to_string()],
            pdflatex_runs: 2,
            pdf_timeout: Duration::from_secs(120),
            terminate_grace: Duration::from_secs(10),
        }
    }
}

/// Settings for the worker pool and scanner.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub jobs_dir: PathBuf,
    pub max_concurrent_jobs: usize,
    pub scan_interval: Duration,
    /// Upper bound on a worker's wait for the next job, so it can notice shutdown
    pub poll_timeout: Duration,
    pub stale_running: StaleRunningPolicy,
}

impl ManagerConfig {
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
            max_concurrent_jobs: 2,
            scan_interval: Duration::from_secs(5),
            poll_timeout: Duration::from_secs(1),
            stale_running: StaleRunningPolicy::Leave,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
