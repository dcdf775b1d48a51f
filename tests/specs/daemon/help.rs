//! Daemon help and version specs
//!
//! Verify mjd --help, --version, and related flags work without
//! acquiring the daemon lock (no startup attempt).

use crate::prelude::*;

fn mjd() -> assert_cmd::Command {
    assert_cmd::Command::new(mjd_binary())
}

#[test]
fn mjd_version_shows_version() {
    for flag in ["--version", "-v", "-V"] {
        mjd()
            .arg(flag)
            .assert()
            .success()
            .stdout(concat!("mjd ", env!("CARGO_PKG_VERSION"), "\n"));
    }
}

#[test]
fn mjd_help_lists_environment_and_options() {
    let output = mjd().arg("--help").assert().success().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("mjd "), "got: {stdout}");
    for expected in [
        "USAGE:",
        "MAX_CONCURRENT_JOBS",
        "JOB_SCAN_INTERVAL",
        "PDFLATEX_COMMAND",
        "MJ_STALE_RUNNING",
        "-h, --help",
    ] {
        assert!(stdout.contains(expected), "missing {expected}: {stdout}");
    }
}

#[test]
fn mjd_help_does_not_take_lock() {
    let env = DaemonEnv::new();
    let status = env.command().arg("--help").output().unwrap().status;
    assert!(status.success());
    assert!(!env.state_path().join("mjd.pid").exists());
}

#[test]
fn mjd_rejects_unknown_argument() {
    let output = mjd().arg("--bogus").assert().failure().get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    similar_asserts::assert_eq!(
        stderr,
        "error: unexpected argument '--bogus'\nUsage: mjd [--help | --version]\n"
    );
}
