// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

pub const STATE_DIR: &str = "MJ_STATE_DIR";
pub const CONFIG_FILE: &str = "MJ_CONFIG";
pub const JOBS_DIR: &str = "MJ_JOBS_DIR";
pub const MAX_CONCURRENT_JOBS: &str = "MAX_CONCURRENT_JOBS";
pub const JOB_SCAN_INTERVAL: &str = "JOB_SCAN_INTERVAL";
pub const PDFLATEX_COMMAND: &str = "PDFLATEX_COMMAND";
pub const PDFLATEX_RUNS: &str = "PDFLATEX_RUNS";
pub const TERMINATE_GRACE_MS: &str = "MJ_TERMINATE_GRACE_MS";
pub const STALE_RUNNING: &str = "MJ_STALE_RUNNING";

/// Resolve state directory: MJ_STATE_DIR > XDG_STATE_HOME/mj > ~/.local/state/mj
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    state_dir_from(var)
}

pub(crate) fn state_dir_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = lookup(STATE_DIR) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = lookup("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("mj"));
    }
    let home = lookup("HOME").ok_or(LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/mj"))
}

/// Non-empty value of `name`.
pub fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
