//! Daemon lifecycle specs
//!
//! Verify startup, single-instance locking, and signal-driven shutdown.

use crate::prelude::*;

#[test]
#[serial_test::serial]
fn daemon_writes_pid_and_marker_then_stops_on_sigterm() {
    let env = DaemonEnv::new();
    let daemon = env.start();
    let pid = daemon.pid();

    let pid_file = std::fs::read_to_string(env.state_path().join("mjd.pid")).unwrap();
    assert_eq!(pid_file.trim(), pid.to_string());
    assert!(env.jobs_dir().is_dir());
    assert!(
        env.daemon_log()
            .contains(&format!("--- mjd: starting (pid: {pid}) ---")),
        "{}",
        env.daemon_log()
    );

    let status = daemon.terminate();
    assert!(status.success(), "exit status: {status:?}");
    assert!(!env.state_path().join("mjd.pid").exists());
}

#[test]
#[serial_test::serial]
fn second_daemon_refuses_to_start() {
    let env = DaemonEnv::new();
    let daemon = env.start();

    let output = env.command().output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mjd is already running"), "{stderr}");
    assert!(stderr.contains(&format!("pid: {}", daemon.pid())), "{stderr}");

    daemon.terminate();
}

#[test]
#[serial_test::serial]
fn invalid_setting_fails_startup() {
    let env = DaemonEnv::new().env("MAX_CONCURRENT_JOBS", "zero");
    let output = env.command().output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MAX_CONCURRENT_JOBS"), "{stderr}");
}
