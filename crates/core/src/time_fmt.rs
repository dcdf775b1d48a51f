// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as ISO-8601 with a trailing `Z`, e.g. `2025-06-28T08:41:51.123456Z`.
pub fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
