// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent per-job status record (`status.json`).

use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Contents of a job's `status.json`.
///
/// Fields written by other collaborators that this crate does not model are
/// kept in `extra` so that a load/merge/save cycle never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub status: JobStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disallowed_tools: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_tex_created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_pdf_created: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusRecord {
    /// Fresh record in the `setup` status, as the submission layer writes it.
    pub fn new(created_at: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Setup,
            created_at: created_at.into(),
            started_at: None,
            completed_at: None,
            model: None,
            exercise: None,
            disallowed_tools: None,
            error: None,
            solution_tex_created: None,
            solution_pdf_created: None,
            extra: Map::new(),
        }
    }

    /// Stand-in returned to callers when the on-disk record cannot be read.
    pub fn synthetic_error(message: impl Into<String>, now: impl Into<String>) -> Self {
        let mut record = Self::new(now);
        record.status = JobStatus::Error;
        record.error = Some(message.into());
        record
    }

    /// Model name, treating an empty string as absent.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }

    /// Disallowed-tools flag value, treating an empty string as absent.
    pub fn disallowed_tools(&self) -> Option<&str> {
        self.disallowed_tools.as_deref().filter(|t| !t.is_empty())
    }
}

/// Partial update merged into a [`StatusRecord`].
///
/// Only fields that are `Some` (or present in `extra`) are written; all
/// other fields of the record are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPatch {
    /// Status the record must currently hold for the patch to apply.
    pub expected: Option<JobStatus>,
    pub status: Option<JobStatus>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error: Option<String>,
    pub solution_tex_created: Option<bool>,
    pub solution_pdf_created: Option<bool>,
    pub extra: Map<String, Value>,
}

impl StatusPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Only apply when the record is currently in `status`.
    pub fn expect(mut self, status: JobStatus) -> Self {
        self.expected = Some(status);
        self
    }

    pub fn started_at(mut self, ts: impl Into<String>) -> Self {
        self.started_at = Some(ts.into());
        self
    }

    pub fn completed_at(mut self, ts: impl Into<String>) -> Self {
        self.completed_at = Some(ts.into());
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn solution_tex_created(mut self, created: bool) -> Self {
        self.solution_tex_created = Some(created);
        self
    }

    pub fn solution_pdf_created(mut self, created: bool) -> Self {
        self.solution_pdf_created = Some(created);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Merge this patch into `record`.
    pub fn apply(self, record: &mut StatusRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(ts) = self.started_at {
            record.started_at = Some(ts);
        }
        if let Some(ts) = self.completed_at {
            record.completed_at = Some(ts);
        }
        if let Some(error) = self.error {
            record.error = Some(error);
        }
        if let Some(created) = self.solution_tex_created {
            record.solution_tex_created = Some(created);
        }
        if let Some(created) = self.solution_pdf_created {
            record.solution_pdf_created = Some(created);
        }
        record.extra.extend(self.extra);
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
