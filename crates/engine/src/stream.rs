// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent output capture

use crate::error::ExecuteError;
use mj_core::LogEntry;
use mj_storage::LogSink;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Copy agent stdout into the job log until end-of-stream.
///
/// Each line becomes exactly one log entry, appended in the order read.
/// Lines are decoded lossily so invalid UTF-8 never aborts the stream.
/// Returns the number of entries written.
pub async fn stream_to_log<R>(reader: R, sink: &LogSink) -> Result<usize, ExecuteError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut written = 0;
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(ExecuteError::Output)?;
        if n == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        sink.append(&LogEntry::from_agent_line(line))?;
        written += 1;
    }
    Ok(written)
}

/// Read `reader` to the end, keeping at most `cap` bytes.
///
/// The rest is read and discarded so the writer never blocks on a full pipe.
pub async fn drain_capped<R>(mut reader: R, cap: usize) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok(String::from_utf8_lossy(&kept).into_owned())
}

/// First `max` characters of `text`.
pub(crate) fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
