// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job manager: bounded worker pool, FIFO queue, and recovery scanner
//!
//! `max_concurrent_jobs` workers pull job names off a shared queue and run
//! each through a fresh [`JobExecutor`]. A scanner periodically walks the
//! jobs directory and queues every untracked job still in `setup`, which is
//! how jobs written while the daemon was down (or queued when it crashed)
//! get picked up.
//!
//! Jobs found in `running` at startup are never resumed. Depending on
//! [`StaleRunningPolicy`] they are left alone or marked `error` once.

use crate::config::{ManagerConfig, StaleRunningPolicy};
use crate::error::{ExecuteError, ManagerError};
use crate::executor::{ExecutorDeps, JobExecutor};
use mj_adapters::ProcessAdapter;
use mj_core::{utc_now, JobName, JobStatus, StatusPatch};
use mj_storage::{job_dirs, JobPaths};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const STALE_RUNNING_ERROR: &str = "Interrupted by restart (startup recovery)";

/// Result of [`JobManager::submit_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Queued,
    /// Already waiting in the queue; not queued twice
    AlreadyQueued,
    /// Currently executing; no second process is started
    AlreadyRunning,
}

/// Cheaply clonable handle to the job worker pool.
pub struct JobManager<P: ProcessAdapter> {
    inner: Arc<Inner<P>>,
}

impl<P: ProcessAdapter> Clone for JobManager<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<P: ProcessAdapter> {
    config: ManagerConfig,
    deps: ExecutorDeps<P>,
    state: Mutex<State<P>>,
    queue_ready: Notify,
    shutdown: CancellationToken,
}

struct State<P: ProcessAdapter> {
    queue: VecDeque<JobName>,
    running: HashMap<JobName, RunningJob<P>>,
    tasks: Vec<JoinHandle<()>>,
    started: bool,
    stopping: bool,
}

struct RunningJob<P: ProcessAdapter> {
    executor: Arc<JobExecutor<P>>,
    /// Fired once the job has left the running map
    done: CancellationToken,
}

impl<P: ProcessAdapter> JobManager<P> {
    pub fn new(config: ManagerConfig, deps: ExecutorDeps<P>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                deps,
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    running: HashMap::new(),
                    tasks: Vec::new(),
                    started: false,
                    stopping: false,
                }),
                queue_ready: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Spawn the worker loops and the scanner onto the current tokio runtime.
    pub fn start(&self) -> Result<(), ManagerError> {
        {
            let mut state = self.inner.state.lock();
            if state.stopping {
                return Err(ManagerError::Stopping);
            }
            if state.started {
                return Err(ManagerError::AlreadyStarted);
            }
            state.started = true;
        }

        if self.inner.config.stale_running == StaleRunningPolicy::MarkError {
            self.inner.recover_stale_running();
        }

        let workers = self.inner.config.max_concurrent_jobs.max(1);
        let mut tasks = Vec::with_capacity(workers + 1);
        for worker in 0..workers {
            tasks.push(tokio::spawn(Arc::clone(&self.inner).worker_loop(worker)));
        }
        tasks.push(tokio::spawn(Arc::clone(&self.inner).scanner_loop()));
        self.inner.state.lock().tasks = tasks;

        tracing::info!(
            workers,
            jobs_dir = %self.inner.config.jobs_dir.display(),
            "job manager started"
        );
        Ok(())
    }

    /// Cancel every running job, then stop the workers and the scanner.
    ///
    /// Returns once all agent processes have been terminated and every loop
    /// has exited. Queued jobs stay in `setup` and are picked up again by
    /// the next scanner after a restart.
    pub async fn stop(&self) -> Result<(), ManagerError> {
        let (running, tasks) = {
            let mut state = self.inner.state.lock();
            if !state.started {
                return Err(ManagerError::NotStarted);
            }
            if state.stopping {
                return Err(ManagerError::Stopping);
            }
            state.stopping = true;
            let running: Vec<_> = state
                .running
                .values()
                .map(|job| (Arc::clone(&job.executor), job.done.clone()))
                .collect();
            (running, std::mem::take(&mut state.tasks))
        };
        tracing::info!(running = running.len(), "stopping job manager");

        for (executor, _) in &running {
            executor.cancel_token().cancel();
        }
        for (executor, done) in running {
            done.cancelled().await;
            executor.cancel().await;
        }

        self.inner.shutdown.cancel();
        self.inner.queue_ready.notify_waiters();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "manager task panicked");
            }
        }
        tracing::info!("job manager stopped");
        Ok(())
    }

    /// Queue `name` for execution. Never waits for the job to run.
    pub fn submit_job(&self, name: JobName) -> Result<Submission, ManagerError> {
        self.inner.submit(name)
    }

    /// Cancel `name` if it is currently executing.
    ///
    /// Returns `false` when the job is not running (queued, finished, or
    /// unknown); that means there was nothing to cancel.
    pub async fn cancel_job(&self, name: &JobName) -> bool {
        let found = {
            let state = self.inner.state.lock();
            state
                .running
                .get(name)
                .map(|job| (Arc::clone(&job.executor), job.done.clone()))
        };
        let Some((executor, done)) = found else {
            tracing::debug!(job = %name, "cancel requested for job that is not running");
            return false;
        };

        tracing::info!(job = %name, "cancelling job");
        executor.cancel_token().cancel();
        done.cancelled().await;
        executor.cancel().await;
        true
    }

    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Names of the jobs currently executing, sorted.
    pub fn running_jobs(&self) -> Vec<JobName> {
        let mut names: Vec<_> = self.inner.state.lock().running.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<P: ProcessAdapter> Inner<P> {
    fn submit(&self, name: JobName) -> Result<Submission, ManagerError> {
        let submission = {
            let mut state = self.state.lock();
            if state.stopping {
                return Err(ManagerError::Stopping);
            }
            if state.running.contains_key(&name) {
                Submission::AlreadyRunning
            } else if state.queue.contains(&name) {
                Submission::AlreadyQueued
            } else {
                state.queue.push_back(name.clone());
                Submission::Queued
            }
        };

        match submission {
            Submission::Queued => {
                tracing::info!(job = %name, "job queued");
                self.queue_ready.notify_one();
            }
            _ => tracing::debug!(job = %name, ?submission, "duplicate submission ignored"),
        }
        Ok(submission)
    }

    fn is_tracked(&self, name: &JobName) -> bool {
        let state = self.state.lock();
        state.running.contains_key(name) || state.queue.contains(name)
    }

    /// Pop the next job and register it as running in one step, so a name
    /// is always either queued or running while it is in flight.
    fn claim_next(&self) -> Option<(JobName, Arc<JobExecutor<P>>, CancellationToken)> {
        let mut state = self.state.lock();
        if state.stopping {
            return None;
        }
        let name = state.queue.pop_front()?;
        let executor = Arc::new(
            JobExecutor::new(name.clone(), &self.config.jobs_dir, self.deps.clone())
                .with_cancel_token(self.shutdown.child_token()),
        );
        let done = CancellationToken::new();
        state.running.insert(
            name.clone(),
            RunningJob {
                executor: Arc::clone(&executor),
                done: done.clone(),
            },
        );
        Some((name, executor, done))
    }

    async fn worker_loop(self: Arc<Self>, worker: usize) {
        tracing::debug!(worker, "worker started");
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            let Some((name, executor, done)) = self.claim_next() else {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    _ = tokio::time::timeout(self.config.poll_timeout, self.queue_ready.notified()) => {}
                }
                continue;
            };

            tracing::info!(worker, job = %name, "job started");
            // Own task so a panicking job cannot take the worker down with it
            let task = tokio::spawn({
                let executor = Arc::clone(&executor);
                async move { executor.execute().await }
            });
            match task.await {
                Ok(Ok(outcome)) => tracing::info!(worker, job = %name, ?outcome, "job finished"),
                Ok(Err(ExecuteError::Cancelled)) => {
                    tracing::info!(worker, job = %name, "job cancelled")
                }
                Ok(Err(e)) => tracing::error!(worker, job = %name, error = %e, "job failed"),
                Err(e) => tracing::error!(worker, job = %name, error = %e, "job task panicked"),
            }

            self.state.lock().running.remove(&name);
            done.cancel();
        }
        tracing::debug!(worker, "worker stopped");
    }

    async fn scanner_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.scan_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => self.scan(),
            }
        }
        tracing::debug!("scanner stopped");
    }

    /// Queue every untracked job whose status is `setup`.
    fn scan(&self) {
        let names = match job_dirs(&self.config.jobs_dir) {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    jobs_dir = %self.config.jobs_dir.display(),
                    error = %e,
                    "failed to scan jobs directory"
                );
                return;
            }
        };

        for name in names {
            if self.is_tracked(&name) {
                continue;
            }
            let paths = JobPaths::new(&self.config.jobs_dir, &name);
            match self.deps.store.load(paths.job_dir()) {
                Ok(record) if record.status == JobStatus::Setup => {
                    tracing::info!(job = %name, "found pending job");
                    if let Err(e) = self.submit(name) {
                        tracing::debug!(error = %e, "scan interrupted");
                        return;
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(job = %name, error = %e, "skipping unreadable job"),
            }
        }
    }

    /// Mark untracked `running` jobs as `error`; their agent is gone.
    fn recover_stale_running(&self) {
        let names = match job_dirs(&self.config.jobs_dir) {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "failed to scan jobs directory for stale jobs");
                return;
            }
        };

        for name in names {
            if self.is_tracked(&name) {
                continue;
            }
            let paths = JobPaths::new(&self.config.jobs_dir, &name);
            match self.deps.store.load(paths.job_dir()) {
                Ok(record) if record.status == JobStatus::Running => {
                    let patch = StatusPatch::status(JobStatus::Error)
                        .completed_at(utc_now())
                        .error(STALE_RUNNING_ERROR);
                    match self.deps.store.update(paths.job_dir(), patch) {
                        Ok(_) => tracing::warn!(job = %name, "marked stale running job as error"),
                        Err(e) => {
                            tracing::error!(job = %name, error = %e, "failed to mark stale job")
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(job = %name, error = %e, "skipping unreadable job"),
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
