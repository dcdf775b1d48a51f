// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic read/merge/write of a job's `status.json`.
//!
//! There is no in-memory cache: every call goes to disk, so visibility is
//! naturally shared with readers in other processes. Writes never expose a
//! partial file because the rename of a fully synced temp file is the only
//! commit point.

use crate::layout::STATUS_FILE;
use crate::writer::{FsStatusWriter, StatusWriter};
use mj_core::{utc_now, JobStatus, StatusPatch, StatusRecord};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors from status store operations
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("status file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("corrupt status file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

impl StatusError {
    /// True for errors caused by an absent or unreadable record, as opposed
    /// to a rejected update or a failed write.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, StatusError::Missing(_) | StatusError::Corrupt { .. })
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reads and atomically writes `status.json` files.
pub struct StatusStore<W: StatusWriter = FsStatusWriter> {
    writer: Arc<W>,
}

impl<W: StatusWriter> Clone for StatusStore<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl Default for StatusStore<FsStatusWriter> {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore<FsStatusWriter> {
    pub fn new() -> Self {
        Self::with_writer(FsStatusWriter)
    }
}

impl<W: StatusWriter> StatusStore<W> {
    /// Create a store with a custom writer (for testing).
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Arc::new(writer),
        }
    }

    pub fn status_path(job_dir: &Path) -> PathBuf {
        job_dir.join(STATUS_FILE)
    }

    /// Read and decode the record for `job_dir`.
    pub fn load(&self, job_dir: &Path) -> Result<StatusRecord, StatusError> {
        let path = Self::status_path(job_dir);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StatusError::Missing(path))
            }
            Err(source) => return Err(StatusError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| StatusError::Corrupt { path, source })
    }

    /// Like [`load`](Self::load), but a missing or corrupt file yields a
    /// synthetic `error` record instead of an error.
    pub fn load_lenient(&self, job_dir: &Path) -> StatusRecord {
        match self.load(job_dir) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(job_dir = %job_dir.display(), error = %e, "failed to load job status");
                StatusRecord::synthetic_error(format!("Failed to load status: {e}"), utc_now())
            }
        }
    }

    /// Write `record` atomically: temp file, fsync, rename, fsync directory.
    pub fn save(&self, job_dir: &Path, record: &StatusRecord) -> Result<(), StatusError> {
        let data = serde_json::to_vec_pretty(record)?;
        let path = Self::status_path(job_dir);
        let tmp_path = job_dir.join(format!(
            ".{STATUS_FILE}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let io_err = |source: io::Error| StatusError::Io {
            path: path.clone(),
            source,
        };

        let committed = self
            .writer
            .write_tmp(&tmp_path, &data)
            .and_then(|()| self.writer.fsync_file(&tmp_path))
            .and_then(|()| self.writer.rename(&tmp_path, &path));
        if let Err(e) = committed {
            let _ = self.writer.remove(&tmp_path);
            return Err(io_err(e));
        }

        // The record is committed once renamed; a failed directory fsync only
        // weakens durability across power loss.
        if let Err(e) = self.writer.fsync_dir(job_dir) {
            tracing::warn!(job_dir = %job_dir.display(), error = %e, "failed to fsync job directory");
        }
        Ok(())
    }

    /// Load the current record, merge `patch` into it, and save.
    ///
    /// Rejects patches that would move the status backward or out of a
    /// terminal state, and patches whose expected status does not match the
    /// record. Returns the record as written.
    pub fn update(&self, job_dir: &Path, patch: StatusPatch) -> Result<StatusRecord, StatusError> {
        let mut record = self.load(job_dir)?;
        let next = patch.status.unwrap_or(record.status);
        let unexpected = matches!(patch.expected, Some(e) if e != record.status);
        if unexpected || !record.status.can_transition_to(next) {
            return Err(StatusError::InvalidTransition {
                from: record.status,
                to: next,
            });
        }
        patch.apply(&mut record);
        self.save(job_dir, &record)?;
        Ok(record)
    }
}

#[cfg(test)]
#[path = "status_store_tests.rs"]
mod tests;
