// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::utc_now;

#[test]
fn utc_now_is_iso_with_trailing_z() {
    let ts = utc_now();
    assert!(ts.ends_with('Z'), "got {ts}");
    assert!(!ts.contains("+00:00"), "got {ts}");
    assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "got {ts}");
}
