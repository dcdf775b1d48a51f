// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job executor
//!
//! Drives one job from `setup` to a terminal status: spawns the agent in
//! the job's workspace, streams its stdout into `log.jsonl`, records the
//! outcome, and compiles `solution.tex` when the agent left one behind.
//!
//! Cancellation is cooperative through a [`CancellationToken`]. When it
//! fires, whatever step is in flight is dropped, the agent process is
//! terminated, and the job is marked `cancelled`.

use crate::command::agent_command;
use crate::config::ExecutorConfig;
use crate::error::ExecuteError;
use crate::pdf::compile_pdf;
use crate::stream::{drain_capped, preview, stream_to_log};
use mj_adapters::{ProcessAdapter, ProcessHandle, SpawnedProcess};
use mj_core::{utc_now, JobName, JobStatus, LogEntry, StatusPatch, StatusRecord};
use mj_storage::{JobPaths, LogSink, StatusError, StatusStore};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Bytes of agent stderr kept for the failure log entry
const STDERR_CAPTURE_BYTES: usize = 64 * 1024;
const STDERR_PREVIEW_CHARS: usize = 500;

/// Shared collaborators handed to every executor.
#[derive(Clone)]
pub struct ExecutorDeps<P> {
    pub processes: P,
    pub store: StatusStore,
    pub config: Arc<ExecutorConfig>,
}

/// How an execution ended, other than by cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { tex_created: bool, pdf_created: bool },
    /// The job was marked `error` with this message
    Failed { error: String },
    /// The job's status did not allow it to start; nothing was run
    Skipped { status: JobStatus },
}

pub struct JobExecutor<P: ProcessAdapter> {
    name: JobName,
    paths: JobPaths,
    log: LogSink,
    deps: ExecutorDeps<P>,
    child: Mutex<Option<Box<dyn ProcessHandle>>>,
    cancel: CancellationToken,
}

impl<P: ProcessAdapter> JobExecutor<P> {
    pub fn new(name: JobName, jobs_dir: &Path, deps: ExecutorDeps<P>) -> Self {
        let paths = JobPaths::new(jobs_dir, &name);
        Self {
            log: LogSink::new(paths.log_file()),
            name,
            paths,
            deps,
            child: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` for cancellation, e.g. a child of the manager's shutdown token.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the job to completion.
    ///
    /// Returns `Err(ExecuteError::Cancelled)` after cleanup if the job was
    /// cancelled. Any other failure is recorded as `error` status and
    /// reported as [`JobOutcome::Failed`]; an `Err` other than `Cancelled`
    /// means even that could not be written.
    pub async fn execute(&self) -> Result<JobOutcome, ExecuteError> {
        let span = tracing::info_span!("job", job = %self.name);
        async {
            tracing::info!("executing");
            let start = std::time::Instant::now();

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(self.finish_cancelled().await),
                result = self.run() => result,
            };

            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(outcome) => tracing::info!(?outcome, elapsed_ms, "finished"),
                Err(ExecuteError::Cancelled) => tracing::info!(elapsed_ms, "cancelled"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Cancel the job and stop its agent process, if one is still running.
    ///
    /// Idempotent: once the process has exited this only re-fires the
    /// (already cancelled) token.
    pub async fn cancel(&self) {
        self.cancel.cancel();
        self.terminate_child().await;
    }

    async fn run(&self) -> Result<JobOutcome, ExecuteError> {
        match self.run_agent().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.terminate_child().await;
                let error = e.to_string();
                tracing::error!(error = %error, "job execution failed");
                self.mark_failed(&error)?;
                Ok(JobOutcome::Failed { error })
            }
        }
    }

    async fn run_agent(&self) -> Result<JobOutcome, ExecuteError> {
        let store = &self.deps.store;
        let config = &self.deps.config;
        let job_dir = self.paths.job_dir();

        let running = StatusPatch::status(JobStatus::Running)
            .expect(JobStatus::Setup)
            .started_at(utc_now());
        let record = match store.update(job_dir, running) {
            Ok(record) => record,
            Err(StatusError::InvalidTransition { from, .. }) => {
                tracing::info!(status = %from, "job is not startable, skipping");
                return Ok(JobOutcome::Skipped { status: from });
            }
            Err(e) => return Err(e.into()),
        };

        let model = record.model().unwrap_or(&config.default_model);
        let spec = agent_command(
            &config.model_map,
            model,
            record.disallowed_tools(),
            &self.paths.workspace(),
        );

        let SpawnedProcess {
            stdout,
            stderr,
            handle,
        } = self.deps.processes.spawn(&spec).await?;
        *self.child.lock().await = Some(handle);

        // Drained on its own task so a chatty agent never blocks on stderr
        let stderr_task = tokio::spawn(drain_capped(stderr, STDERR_CAPTURE_BYTES));

        let lines = stream_to_log(stdout, &self.log).await?;
        tracing::debug!(lines, "agent output closed");

        let code = {
            let mut slot = self.child.lock().await;
            match slot.as_mut() {
                Some(child) => child.wait().await?,
                None => return Err(ExecuteError::Cancelled),
            }
        };

        let stderr_text = match stderr_task.await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read agent stderr");
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "agent stderr reader panicked");
                String::new()
            }
        };

        if code != 0 {
            let stderr_text = stderr_text.trim();
            if !stderr_text.is_empty() {
                self.log.append_or_warn(&LogEntry::error(format!(
                    "Agent stderr: {}",
                    preview(stderr_text, STDERR_PREVIEW_CHARS)
                )));
            }
            let error = format!("Process exited with code {code}");
            store.update(
                job_dir,
                StatusPatch::status(JobStatus::Error)
                    .completed_at(utc_now())
                    .error(error.clone()),
            )?;
            tracing::warn!(code, "agent exited with failure");
            return Ok(JobOutcome::Failed { error });
        }

        let tex_created = self.paths.solution_tex().exists();
        let pdf_created = if tex_created && !self.paths.solution_pdf().exists() {
            compile_pdf(
                &self.deps.processes,
                config,
                &self.paths.workspace(),
                &self.log,
            )
            .await
        } else {
            self.paths.solution_pdf().exists()
        };

        store.update(
            job_dir,
            StatusPatch::status(JobStatus::Completed)
                .completed_at(utc_now())
                .solution_tex_created(tex_created)
                .solution_pdf_created(pdf_created),
        )?;
        Ok(JobOutcome::Completed {
            tex_created,
            pdf_created,
        })
    }

    /// Record `error` as the job's failure.
    ///
    /// If the status file itself is missing or corrupt, a fresh `error`
    /// record replaces it so the failure stays visible.
    fn mark_failed(&self, error: &str) -> Result<(), ExecuteError> {
        let job_dir = self.paths.job_dir();
        let patch = StatusPatch::status(JobStatus::Error)
            .completed_at(utc_now())
            .error(error);
        match self.deps.store.update(job_dir, patch) {
            Ok(_) => Ok(()),
            Err(e) if e.is_unreadable() => {
                tracing::warn!(error = %e, "status unreadable, writing fresh error record");
                let mut record = StatusRecord::synthetic_error(error, utc_now());
                record.completed_at = Some(utc_now());
                self.deps.store.save(job_dir, &record)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn finish_cancelled(&self) -> ExecuteError {
        self.terminate_child().await;
        let patch = StatusPatch::status(JobStatus::Cancelled).completed_at(utc_now());
        match self.deps.store.update(self.paths.job_dir(), patch) {
            Ok(_) => {
                self.log.append_or_warn(&LogEntry::system("Job cancelled"));
            }
            Err(StatusError::InvalidTransition { from, .. }) => {
                tracing::info!(status = %from, "job already finished, keeping status");
            }
            Err(e) => tracing::error!(error = %e, "failed to mark job cancelled"),
        }
        ExecuteError::Cancelled
    }

    async fn terminate_child(&self) {
        let mut slot = self.child.lock().await;
        let Some(child) = slot.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to poll agent process"),
        }

        let pid = child.id();
        match child.terminate(self.deps.config.terminate_grace).await {
            Ok(code) => tracing::info!(?pid, code, "agent process terminated"),
            Err(e) => tracing::error!(?pid, error = %e, "failed to terminate agent process"),
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
