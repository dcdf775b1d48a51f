// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{JobName, JobStatus, StatusRecord};

pub const TEST_CREATED_AT: &str = "2025-06-28T08:41:51.000000Z";

/// Job name for tests; panics on invalid input.
#[allow(clippy::expect_used)]
pub fn job_name(name: &str) -> JobName {
    JobName::parse(name).expect("valid test job name")
}

/// Record as the submission layer writes it for a new job.
pub fn setup_record(model: &str) -> StatusRecord {
    let mut record = StatusRecord::new(TEST_CREATED_AT);
    record.model = Some(model.to_string());
    record.exercise = Some("ana2/blatt1_ex6".to_string());
    record.disallowed_tools = Some(String::new());
    record
}

/// Record already moved to `status`.
pub fn record_with_status(status: JobStatus) -> StatusRecord {
    let mut record = setup_record("claude-opus-4");
    record.status = status;
    record
}
