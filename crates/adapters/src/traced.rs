// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::process::{CommandSpec, ProcessAdapter, ProcessError, ProcessOutput, SpawnedProcess};
use async_trait::async_trait;
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcesses<P> {
    inner: P,
}

impl<P> TracedProcesses<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcesses<P> {
    async fn spawn(&self, spec: &CommandSpec) -> Result<SpawnedProcess, ProcessError> {
        async {
            tracing::info!(command = %spec, "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(child) => tracing::info!(pid = ?child.handle.id(), elapsed_ms, "process spawned"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!(
            "process.spawn",
            program = %spec.program,
            cwd = %spec.cwd.display()
        ))
        .await
    }

    async fn run(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        async {
            tracing::debug!(command = %spec, timeout_ms = timeout.as_millis() as u64, "running");
            let start = std::time::Instant::now();
            let result = self.inner.run(spec, timeout).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(output) => tracing::info!(code = output.code, elapsed_ms, "process finished"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "run failed"),
            }
            result
        }
        .instrument(tracing::info_span!(
            "process.run",
            program = %spec.program,
            cwd = %spec.cwd.display()
        ))
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
