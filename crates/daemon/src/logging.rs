// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon log file: startup marker, rotation, and the tracing subscriber.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::lifecycle::LifecycleError;

/// Startup marker prefix written to log before anything else.
/// Full format: "--- mjd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- mjd: starting (pid: ";

/// Maximum daemon log size before rotation (10 MB).
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated files to keep (mjd.log.1, .2, .3).
const MAX_ROTATED_FILES: u32 = 3;

/// Write startup marker to log file (appends to existing log)
pub fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    if let Some(parent) = config.log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Write startup error synchronously to log file.
///
/// The tracing writer is non-blocking and may not flush before exit.
pub fn write_startup_error(config: &Config, error: &LifecycleError) {
    let Ok(mut file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

/// Rotate `path` to `path.1` once it exceeds [`MAX_LOG_SIZE`].
///
/// Older rotations shift up by one; the oldest is dropped.
pub fn rotate_log_if_needed(path: &Path) {
    let size = match fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size <= MAX_LOG_SIZE {
        return;
    }

    let path_str = path.display().to_string();
    // .3 is overwritten, .2 -> .3, .1 -> .2
    for i in (1..MAX_ROTATED_FILES).rev() {
        let _ = fs::rename(format!("{path_str}.{i}"), format!("{path_str}.{}", i + 1));
    }
    let _ = fs::rename(path, format!("{path_str}.1"));
}

/// Install the global subscriber writing to the daemon log file.
///
/// The returned guard flushes buffered lines when dropped.
pub fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = config.log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    let file_name = config
        .log_path
        .file_name()
        .ok_or(LifecycleError::NoStateDir)?;
    fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
