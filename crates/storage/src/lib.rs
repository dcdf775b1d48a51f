// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! On-disk job state: status records, event logs, directory layout

mod jobs;
mod layout;
mod log_sink;
mod status_store;
mod writer;

pub use jobs::{job_dirs, list_jobs, read_job, JobDetail, JobReadError};
pub use layout::{
    JobPaths, LOG_FILE, PROMPT_FILE, SOLUTION_PDF, SOLUTION_TEX, STATUS_FILE, WORKSPACE_DIR,
};
pub use log_sink::{LogError, LogSink};
pub use status_store::{StatusError, StatusStore};
pub use writer::{FsStatusWriter, StatusWriter};
