// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File operations behind the atomic status write.
//!
//! The write protocol is: write temp file, fsync it, rename it over the
//! target, fsync the directory. Routing every step through
//! [`StatusWriter`] lets tests inject a failure at any point and verify
//! that the target file is never left half-written.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

pub trait StatusWriter: Send + Sync + 'static {
    /// Write data to a temporary file next to the target.
    fn write_tmp(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Fsync a file so its contents are durable.
    fn fsync_file(&self, path: &Path) -> io::Result<()>;

    /// Atomically replace `to` with `from`. This is the commit point.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Fsync a directory so a rename inside it is durable.
    fn fsync_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove a leftover temporary file.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Production writer using real filesystem operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStatusWriter;

impl StatusWriter for FsStatusWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        file.flush()
    }

    fn fsync_file(&self, path: &Path) -> io::Result<()> {
        File::open(path)?.sync_all()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn fsync_dir(&self, path: &Path) -> io::Result<()> {
        File::open(path)?.sync_all()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
