// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::process::Command;

#[tokio::test]
async fn run_with_timeout_success() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo")
        .await
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
}

#[tokio::test]
async fn run_with_timeout_nonzero_exit_is_not_an_error() {
    let cmd = Command::new("false");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "false")
        .await
        .unwrap();
    assert_eq!(exit_code(output.status), 1);
}

#[tokio::test]
async fn run_with_timeout_spawn_error() {
    let cmd = Command::new("/nonexistent/binary");
    let err = run_with_timeout(cmd, Duration::from_secs(5), "nonexistent")
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::Spawn { .. }), "got: {err:?}");
    assert!(err.to_string().contains("nonexistent"), "got: {err}");
}

#[tokio::test]
async fn run_with_timeout_timeout_elapsed() {
    let mut cmd = Command::new("sleep");
    cmd.arg("10");
    let err = run_with_timeout(cmd, Duration::from_millis(100), "test sleep")
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::TimedOut { .. }), "got: {err:?}");
    assert!(err.to_string().contains("timed out"), "got: {err}");
    assert!(err.to_string().contains("test sleep"), "got: {err}");
}

#[tokio::test]
async fn exit_code_reports_signal_as_negative() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "kill -TERM $$"]);
    let output = run_with_timeout(cmd, Duration::from_secs(5), "self-kill")
        .await
        .unwrap();
    assert_eq!(exit_code(output.status), -15);
}
