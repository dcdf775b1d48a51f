// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    CommandSpec, ProcessAdapter, ProcessError, ProcessHandle, ProcessOutput, SpawnedProcess,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, Cursor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, DuplexStream};

/// Exit code reported for a fake child stopped by `terminate`
const TERMINATED_CODE: i32 = -15;

/// Recorded process call
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessCall {
    Spawn { spec: CommandSpec },
    Run { spec: CommandSpec, timeout: Duration },
    Terminate { program: String, pid: u32 },
}

/// Scripted behavior for one program name.
#[derive(Debug, Clone, Default)]
pub struct FakeProgram {
    pub stdout: Vec<String>,
    pub stderr: String,
    pub exit_code: i32,
    /// Files written into the working directory when the program starts
    pub creates: Vec<(String, String)>,
    /// Keep stdout open and never exit until terminated
    pub hangs: bool,
    pub spawn_error: Option<String>,
}

impl FakeProgram {
    pub fn exits(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Self::default()
        }
    }

    /// Program that prints its scripted lines and then blocks until terminated.
    pub fn hangs() -> Self {
        Self {
            hangs: true,
            ..Self::default()
        }
    }

    pub fn fails_to_spawn(message: impl Into<String>) -> Self {
        Self {
            spawn_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn stdout_line(mut self, line: impl Into<String>) -> Self {
        self.stdout.push(line.into());
        self
    }

    pub fn stderr(mut self, text: impl Into<String>) -> Self {
        self.stderr = text.into();
        self
    }

    pub fn creates(mut self, file: impl Into<String>, contents: impl Into<String>) -> Self {
        self.creates.push((file.into(), contents.into()));
        self
    }

    fn stdout_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for line in &self.stdout {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
        }
        bytes
    }

    fn write_files(&self, cwd: &std::path::Path) -> io::Result<()> {
        for (file, contents) in &self.creates {
            let path = cwd.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }
        Ok(())
    }
}

struct FakeProcessState {
    programs: HashMap<String, FakeProgram>,
    calls: Vec<ProcessCall>,
    next_pid: u32,
}

/// Fake process adapter for testing
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                programs: HashMap::new(),
                calls: Vec::new(),
                next_pid: 1000,
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior of `program`. Unscripted programs fail to spawn.
    pub fn script(&self, program: &str, behavior: FakeProgram) {
        self.inner
            .lock()
            .programs
            .insert(program.to_string(), behavior);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of spawn or run calls for `program`
    pub fn invocations(&self, program: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| match c {
                ProcessCall::Spawn { spec } | ProcessCall::Run { spec, .. } => {
                    spec.program == program
                }
                ProcessCall::Terminate { .. } => false,
            })
            .count()
    }

    /// Number of terminate calls that reached a still-running child
    pub fn terminations(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ProcessCall::Terminate { .. }))
            .count()
    }

    /// Working directory of the most recent invocation of `program`
    pub fn last_cwd(&self, program: &str) -> Option<PathBuf> {
        self.inner.lock().calls.iter().rev().find_map(|c| match c {
            ProcessCall::Spawn { spec } | ProcessCall::Run { spec, .. }
                if spec.program == program =>
            {
                Some(spec.cwd.clone())
            }
            _ => None,
        })
    }

    fn start(
        &self,
        spec: &CommandSpec,
        call: ProcessCall,
    ) -> Result<(FakeProgram, u32), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        let program = inner.programs.get(&spec.program).cloned().ok_or_else(|| {
            ProcessError::Spawn {
                program: spec.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
            }
        })?;
        if let Some(message) = &program.spawn_error {
            return Err(ProcessError::Spawn {
                program: spec.program.clone(),
                source: io::Error::other(message.clone()),
            });
        }
        inner.next_pid += 1;
        Ok((program, inner.next_pid))
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, spec: &CommandSpec) -> Result<SpawnedProcess, ProcessError> {
        let (program, pid) = self.start(spec, ProcessCall::Spawn { spec: spec.clone() })?;
        program
            .write_files(&spec.cwd)
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let stdout_bytes = program.stdout_bytes();
        let stderr = Box::new(Cursor::new(program.stderr.clone().into_bytes()));

        if program.hangs {
            // Hold the write half open so readers block after the scripted lines
            let (reader, mut writer) = tokio::io::duplex(stdout_bytes.len() + 1024);
            writer
                .write_all(&stdout_bytes)
                .await
                .map_err(|source| ProcessError::Io {
                    context: "fake stdout",
                    source,
                })?;
            return Ok(SpawnedProcess {
                stdout: Box::new(reader),
                stderr,
                handle: Box::new(FakeChild {
                    adapter: self.clone(),
                    program: spec.program.clone(),
                    pid,
                    status: None,
                    stdout_writer: Some(writer),
                }),
            });
        }

        Ok(SpawnedProcess {
            stdout: Box::new(Cursor::new(stdout_bytes)),
            stderr,
            handle: Box::new(FakeChild {
                adapter: self.clone(),
                program: spec.program.clone(),
                pid,
                status: Some(program.exit_code),
                stdout_writer: None,
            }),
        })
    }

    async fn run(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let call = ProcessCall::Run {
            spec: spec.clone(),
            timeout,
        };
        let (program, _pid) = self.start(spec, call)?;
        if program.hangs {
            return Err(ProcessError::TimedOut {
                description: spec.program.clone(),
                timeout,
            });
        }
        program
            .write_files(&spec.cwd)
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;
        Ok(ProcessOutput {
            code: program.exit_code,
            stdout: program.stdout_bytes(),
            stderr: program.stderr.into_bytes(),
        })
    }
}

struct FakeChild {
    adapter: FakeProcessAdapter,
    program: String,
    pid: u32,
    status: Option<i32>,
    stdout_writer: Option<DuplexStream>,
}

#[async_trait]
impl ProcessHandle for FakeChild {
    fn id(&self) -> Option<u32> {
        self.status.is_none().then_some(self.pid)
    }

    fn try_wait(&mut self) -> Result<Option<i32>, ProcessError> {
        Ok(self.status)
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        match self.status {
            Some(code) => Ok(code),
            None => std::future::pending().await,
        }
    }

    async fn terminate(&mut self, _grace: Duration) -> Result<i32, ProcessError> {
        if let Some(code) = self.status {
            return Ok(code);
        }
        self.adapter.inner.lock().calls.push(ProcessCall::Terminate {
            program: self.program.clone(),
            pid: self.pid,
        });
        // Closing stdout lets readers observe end-of-stream
        drop(self.stdout_writer.take());
        self.status = Some(TERMINATED_CODE);
        Ok(TERMINATED_CODE)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
