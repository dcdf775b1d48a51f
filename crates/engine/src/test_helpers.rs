// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::config::ExecutorConfig;
use crate::executor::ExecutorDeps;
use mj_adapters::FakeProcessAdapter;
use mj_core::test_support::job_name;
use mj_core::{JobName, LogEntry, StatusRecord};
use mj_storage::{JobPaths, LogSink, StatusStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Temporary jobs directory plus the fakes an executor or manager needs.
pub(crate) struct JobFixture {
    _dir: TempDir,
    pub jobs_dir: PathBuf,
    pub fake: FakeProcessAdapter,
    pub store: StatusStore,
}

impl JobFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let jobs_dir = dir.path().join("jobs");
        std::fs::create_dir_all(&jobs_dir).unwrap();
        Self {
            _dir: dir,
            jobs_dir,
            fake: FakeProcessAdapter::new(),
            store: StatusStore::new(),
        }
    }

    /// Lay out a job the way the submission layer does: status record,
    /// workspace, and prompt.
    pub fn create_job(&self, name: &str, record: &StatusRecord) -> JobName {
        let name = job_name(name);
        let paths = self.paths(&name);
        std::fs::create_dir_all(paths.workspace()).unwrap();
        std::fs::write(paths.prompt_file(), "Solve exercise 6.\n").unwrap();
        self.store.save(paths.job_dir(), record).unwrap();
        name
    }

    pub fn paths(&self, name: &JobName) -> JobPaths {
        JobPaths::new(&self.jobs_dir, name)
    }

    pub fn status(&self, name: &JobName) -> StatusRecord {
        self.store.load(self.paths(name).job_dir()).unwrap()
    }

    pub fn log(&self, name: &JobName) -> Vec<LogEntry> {
        LogSink::new(self.paths(name).log_file())
            .read_entries()
            .unwrap()
    }

    pub fn deps(&self) -> ExecutorDeps<FakeProcessAdapter> {
        self.deps_with(ExecutorConfig::default())
    }

    pub fn deps_with(&self, config: ExecutorConfig) -> ExecutorDeps<FakeProcessAdapter> {
        ExecutorDeps {
            processes: self.fake.clone(),
            store: self.store.clone(),
            config: Arc::new(config),
        }
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }
}

/// Poll `cond` until it holds, giving up after a few seconds.
pub(crate) async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
