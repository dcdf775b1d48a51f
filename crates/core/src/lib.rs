// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mj-core: job model shared by the mathjobs crates

pub mod job_name;
pub mod log_entry;
pub mod record;
pub mod status;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use job_name::{InvalidJobName, JobName};
pub use log_entry::{AgentEvent, EventKind, LogEntry};
pub use record::{StatusPatch, StatusRecord};
pub use status::JobStatus;
pub use time_fmt::utc_now;
