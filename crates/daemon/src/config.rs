// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration
//!
//! Resolution order, later wins: built-in defaults, the optional TOML file
//! (`MJ_CONFIG` or `<state_dir>/config.toml`), then environment overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use mj_engine::{ExecutorConfig, ManagerConfig, StaleRunningPolicy};
use serde::Deserialize;

use crate::env;
use crate::lifecycle::LifecycleError;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/mj)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    pub manager: ManagerConfig,
    pub executor: ExecutorConfig,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    jobs_dir: Option<PathBuf>,
    max_concurrent_jobs: Option<usize>,
    scan_interval_secs: Option<u64>,
    poll_timeout_ms: Option<u64>,
    stale_running: Option<StaleRunningPolicy>,
    default_model: Option<String>,
    default_tool: Option<String>,
    /// Extra exact model -> tool mappings
    models: BTreeMap<String, String>,
    pdflatex_command: Option<String>,
    pdflatex_args: Option<Vec<String>>,
    pdflatex_runs: Option<u32>,
    pdf_timeout_secs: Option<u64>,
    terminate_grace_ms: Option<u64>,
}

impl Config {
    /// Load configuration for the user-level daemon from the process environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        let path = env::var(env::CONFIG_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| state_dir.join("config.toml"));
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Self::resolve(state_dir, text.as_deref().map(|t| (path.as_path(), t)), env::var)
    }

    /// Build a configuration from explicit sources.
    ///
    /// `file` is the config file path and its contents; `lookup` answers
    /// environment variable queries.
    pub fn resolve(
        state_dir: PathBuf,
        file: Option<(&Path, &str)>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LifecycleError> {
        let file = match file {
            Some((path, text)) => {
                toml::from_str::<FileConfig>(text).map_err(|source| LifecycleError::Config {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => FileConfig::default(),
        };

        let jobs_dir = lookup(env::JOBS_DIR)
            .map(PathBuf::from)
            .or(file.jobs_dir)
            .unwrap_or_else(|| state_dir.join("jobs"));

        let mut manager = ManagerConfig::new(jobs_dir);
        if let Some(n) = file.max_concurrent_jobs {
            manager.max_concurrent_jobs = n;
        }
        if let Some(secs) = file.scan_interval_secs {
            manager.scan_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = file.poll_timeout_ms {
            manager.poll_timeout = Duration::from_millis(ms);
        }
        if let Some(policy) = file.stale_running {
            manager.stale_running = policy;
        }

        let mut executor = ExecutorConfig::default();
        if let Some(model) = file.default_model {
            executor.default_model = model;
        }
        if let Some(tool) = file.default_tool {
            executor.model_map = executor.model_map.with_default_tool(tool);
        }
        for (model, tool) in file.models {
            executor.model_map = executor.model_map.with_model(model, tool);
        }
        if let Some(command) = file.pdflatex_command {
            executor.pdflatex_command = command;
        }
        if let Some(args) = file.pdflatex_args {
            executor.pdflatex_args = args;
        }
        if let Some(runs) = file.pdflatex_runs {
            executor.pdflatex_runs = runs;
        }
        if let Some(secs) = file.pdf_timeout_secs {
            executor.pdf_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.terminate_grace_ms {
            executor.terminate_grace = Duration::from_millis(ms);
        }

        if let Some(n) = parse_env(&lookup, env::MAX_CONCURRENT_JOBS)? {
            manager.max_concurrent_jobs = n;
        }
        if let Some(secs) = parse_env::<u64>(&lookup, env::JOB_SCAN_INTERVAL)? {
            manager.scan_interval = Duration::from_secs(secs);
        }
        if let Some(policy) = parse_env(&lookup, env::STALE_RUNNING)? {
            manager.stale_running = policy;
        }
        if let Some(command) = lookup(env::PDFLATEX_COMMAND) {
            executor.pdflatex_command = command;
        }
        if let Some(runs) = parse_env(&lookup, env::PDFLATEX_RUNS)? {
            executor.pdflatex_runs = runs;
        }
        if let Some(ms) = parse_env::<u64>(&lookup, env::TERMINATE_GRACE_MS)? {
            executor.terminate_grace = Duration::from_millis(ms);
        }

        if manager.max_concurrent_jobs == 0 {
            return Err(LifecycleError::InvalidSetting {
                name: "max_concurrent_jobs",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if manager.scan_interval.is_zero() {
            return Err(LifecycleError::InvalidSetting {
                name: "scan_interval",
                value: "0".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            lock_path: state_dir.join("mjd.pid"),
            log_path: state_dir.join("mjd.log"),
            state_dir,
            manager,
            executor,
        })
    }
}

fn parse_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, LifecycleError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| LifecycleError::InvalidSetting {
            name,
            value: value.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
