// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use mj_adapters::{ProcessAdapter, TokioProcessAdapter, TracedProcesses};
use mj_engine::{ExecutorDeps, JobManager, ManagerError};
use mj_storage::StatusStore;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

/// Process adapter used by the real daemon
pub type DaemonProcesses = TracedProcesses<TokioProcessAdapter>;

/// Daemon state during operation.
pub struct Daemon<P: ProcessAdapter = DaemonProcesses> {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub manager: JobManager<P>,
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting {name}={value}: {reason}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Job manager error: {0}")]
    Manager(#[from] ManagerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon with the real process adapter.
pub fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    startup_with(config, TracedProcesses::new(TokioProcessAdapter::new()))
}

/// Start the daemon: take the single-instance lock, then start the job manager.
///
/// Must be called from within a tokio runtime.
pub fn startup_with<P: ProcessAdapter>(
    config: &Config,
    processes: P,
) -> Result<Daemon<P>, LifecycleError> {
    match startup_inner(config, processes) {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // The lock file belongs to the running daemon when locking failed
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

fn startup_inner<P: ProcessAdapter>(
    config: &Config,
    processes: P,
) -> Result<Daemon<P>, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons driving one jobs dir.
    // Open without truncating so a failed attempt keeps the owner's PID.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Jobs directory
    std::fs::create_dir_all(&config.manager.jobs_dir)?;

    // 4. Start workers and scanner
    let deps = ExecutorDeps {
        processes,
        store: StatusStore::new(),
        config: Arc::new(config.executor.clone()),
    };
    let manager = JobManager::new(config.manager.clone(), deps);
    manager.start()?;

    info!(
        jobs_dir = %config.manager.jobs_dir.display(),
        max_concurrent_jobs = config.manager.max_concurrent_jobs,
        scan_interval_secs = config.manager.scan_interval.as_secs(),
        stale_running = ?config.manager.stale_running,
        "daemon started"
    );

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        manager,
    })
}

impl<P: ProcessAdapter> Daemon<P> {
    /// Shutdown the daemon gracefully.
    ///
    /// Running jobs are cancelled and their agent processes terminated
    /// before the lock is released.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Stop the manager; returns once every agent process is gone
        self.manager.stop().await?;

        // 2. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 3. Lock file is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.lock_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.lock_path) {
            warn!("Failed to remove PID file during cleanup: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
