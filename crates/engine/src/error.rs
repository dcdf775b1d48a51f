// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for job execution and the manager

use mj_adapters::ProcessError;
use mj_storage::{LogError, StatusError};
use std::io;
use thiserror::Error;

/// Errors that end a job execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The job was cancelled; its status has been set to `cancelled`
    #[error("job cancelled")]
    Cancelled,
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("failed to read agent output: {0}")]
    Output(#[source] io::Error),
}

/// Errors from manager lifecycle calls
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("job manager already started")]
    AlreadyStarted,
    #[error("job manager not started")]
    NotStarted,
    #[error("job manager is stopping")]
    Stopping,
}
