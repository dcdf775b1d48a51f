// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only `log.jsonl` writer for one job.
//!
//! Each `append()` call opens, writes, and closes the file. The whole line
//! (JSON plus newline) goes out in a single `write_all` on a file opened in
//! append mode, so concurrent readers see either the full line or nothing.

use mj_core::LogEntry;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single line.
    pub fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut line = entry.to_line()?;
        line.push('\n');
        self.write_line(line.as_bytes())
            .map_err(|source| LogError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Append, logging failures via tracing instead of returning them.
    ///
    /// Used for diagnostic entries where a full disk must not turn a
    /// finished job into a failed one.
    pub fn append_or_warn(&self, entry: &LogEntry) {
        if let Err(e) = self.append(entry) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to append job log entry"
            );
        }
    }

    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line)
    }

    /// Read every entry back in file order.
    ///
    /// A missing log is empty. Blank lines are skipped; malformed lines come
    /// back as `system` notes rather than failing the whole read.
    pub fn read_entries(&self) -> Result<Vec<LogEntry>, LogError> {
        let io_err = |source| LogError::Io {
            path: self.path.clone(),
            source,
        };
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(LogEntry::from_log_line(&line));
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "log_sink_tests.rs"]
mod tests;
