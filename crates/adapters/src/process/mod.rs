// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process adapters

mod native;

pub use native::TokioProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessAdapter, FakeProgram, ProcessCall};

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),
    #[error("failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{description} timed out after {}s", timeout.as_secs())]
    TimedOut {
        description: String,
        timeout: Duration,
    },
}

/// Program, arguments and working directory of a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a run-to-completion process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; death by signal N is `-N`
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Control over a running child.
#[async_trait]
pub trait ProcessHandle: Send + Sync + 'static {
    /// OS process id, if the child has not been reaped yet
    fn id(&self) -> Option<u32>;

    /// Exit code if the child has already exited
    fn try_wait(&mut self) -> Result<Option<i32>, ProcessError>;

    /// Wait for the child to exit and return its exit code
    async fn wait(&mut self) -> Result<i32, ProcessError>;

    /// Ask the child to stop (SIGTERM), escalating to SIGKILL after `grace`,
    /// and wait for it to exit.
    async fn terminate(&mut self, grace: Duration) -> Result<i32, ProcessError>;
}

/// A spawned child with its output pipes detached from the handle, so the
/// pipes can be drained while the handle is used to wait or terminate.
pub struct SpawnedProcess {
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
    pub handle: Box<dyn ProcessHandle>,
}

impl fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("pid", &self.handle.id())
            .finish_non_exhaustive()
    }
}

/// Adapter for launching child processes
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Spawn `spec` with stdout/stderr piped and stdin closed.
    async fn spawn(&self, spec: &CommandSpec) -> Result<SpawnedProcess, ProcessError>;

    /// Run `spec` to completion, capturing its output, bounded by `timeout`.
    async fn run(&self, spec: &CommandSpec, timeout: Duration)
        -> Result<ProcessOutput, ProcessError>;
}
