// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-side helpers over the jobs root directory.

use crate::layout::JobPaths;
use crate::log_sink::{LogError, LogSink};
use crate::status_store::{StatusError, StatusStore};
use crate::writer::StatusWriter;
use mj_core::{JobName, LogEntry, StatusRecord};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobReadError {
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Log(#[from] LogError),
}

/// Status plus full log of one job.
#[derive(Debug, Clone)]
pub struct JobDetail {
    pub name: JobName,
    pub status: StatusRecord,
    pub log: Vec<LogEntry>,
}

/// Job directories directly under `jobs_dir`, sorted by name.
///
/// Non-directories and entries whose names are not valid job names are
/// skipped. A missing root yields an empty list.
pub fn job_dirs(jobs_dir: &Path) -> io::Result<Vec<JobName>> {
    let entries = match std::fs::read_dir(jobs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let raw = entry.file_name().to_string_lossy().into_owned();
        match JobName::parse(raw) {
            Ok(name) => names.push(name),
            Err(e) => tracing::debug!(error = %e, "skipping directory"),
        }
    }
    names.sort();
    Ok(names)
}

/// Status of every readable job. Unreadable ones are logged and skipped.
pub fn list_jobs<W: StatusWriter>(
    store: &StatusStore<W>,
    jobs_dir: &Path,
) -> io::Result<BTreeMap<JobName, StatusRecord>> {
    let mut jobs = BTreeMap::new();
    for name in job_dirs(jobs_dir)? {
        let paths = JobPaths::new(jobs_dir, &name);
        match store.load(paths.job_dir()) {
            Ok(record) => {
                jobs.insert(name, record);
            }
            Err(e) => tracing::warn!(job = %name, error = %e, "skipping unreadable job"),
        }
    }
    Ok(jobs)
}

pub fn read_job<W: StatusWriter>(
    store: &StatusStore<W>,
    jobs_dir: &Path,
    name: &JobName,
) -> Result<JobDetail, JobReadError> {
    let paths = JobPaths::new(jobs_dir, name);
    let status = store.load(paths.job_dir())?;
    let log = LogSink::new(paths.log_file()).read_entries()?;
    Ok(JobDetail {
        name: name.clone(),
        status,
        log,
    })
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
