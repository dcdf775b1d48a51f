// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Math job execution engine: per-job executor and the worker pool

mod command;
mod config;
mod error;
mod executor;
mod manager;
mod pdf;
mod stream;

#[cfg(test)]
mod test_helpers;

pub use command::{agent_command, ModelMap};
pub use config::{ExecutorConfig, ManagerConfig, StaleRunningPolicy};
pub use error::{ExecuteError, ManagerError};
pub use executor::{ExecutorDeps, JobExecutor, JobOutcome};
pub use manager::{JobManager, Submission};
pub use pdf::compile_pdf;
pub use stream::{drain_capped, stream_to_log};
