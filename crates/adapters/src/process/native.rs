// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real child processes via `tokio::process`

use super::{
    CommandSpec, ProcessAdapter, ProcessError, ProcessHandle, ProcessOutput, SpawnedProcess,
};
use crate::subprocess::{exit_code, run_with_timeout};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Process adapter backed by `tokio::process::Command`
#[derive(Clone, Default)]
pub struct TokioProcessAdapter;

impl TokioProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    cmd
}

fn missing_pipe(name: &'static str) -> ProcessError {
    ProcessError::Io {
        context: name,
        source: io::Error::other("pipe was not captured"),
    }
}

#[async_trait]
impl ProcessAdapter for TokioProcessAdapter {
    async fn spawn(&self, spec: &CommandSpec) -> Result<SpawnedProcess, ProcessError> {
        // Precondition: cwd must exist
        if !spec.cwd.is_dir() {
            return Err(ProcessError::Spawn {
                program: spec.program.clone(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("working directory does not exist: {}", spec.cwd.display()),
                ),
            });
        }

        let mut child = command(spec)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;
        Ok(SpawnedProcess {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            handle: Box::new(TokioChild { child }),
        })
    }

    async fn run(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let output = run_with_timeout(command(spec), timeout, &spec.program).await?;
        Ok(ProcessOutput {
            code: exit_code(output.status),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

struct TokioChild {
    child: Child,
}

fn send_signal(pid: u32, signal: Signal) -> Result<(), ProcessError> {
    let raw = i32::try_from(pid).map_err(|_| ProcessError::Signal {
        pid,
        reason: "pid out of range".to_string(),
    })?;
    match kill(Pid::from_raw(raw), signal) {
        // Already gone; the wait below reaps it
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProcessError::Signal {
            pid,
            reason: e.to_string(),
        }),
    }
}

#[async_trait]
impl ProcessHandle for TokioChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_wait(&mut self) -> Result<Option<i32>, ProcessError> {
        self.child
            .try_wait()
            .map(|status| status.map(exit_code))
            .map_err(ProcessError::Wait)
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        self.child
            .wait()
            .await
            .map(exit_code)
            .map_err(ProcessError::Wait)
    }

    async fn terminate(&mut self, grace: Duration) -> Result<i32, ProcessError> {
        if let Some(code) = self.try_wait()? {
            return Ok(code);
        }

        if let Some(pid) = self.child.id() {
            send_signal(pid, Signal::SIGTERM)?;
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(status) => return status.map(exit_code).map_err(ProcessError::Wait),
                Err(_) => tracing::warn!(
                    pid,
                    grace_ms = grace.as_millis() as u64,
                    "process ignored SIGTERM, sending SIGKILL"
                ),
            }
        }

        self.child.kill().await.map_err(|source| ProcessError::Io {
            context: "failed to kill process",
            source,
        })?;
        self.wait().await
    }
}

#[cfg(test)]
#[path = "native_tests.rs"]
mod tests;
