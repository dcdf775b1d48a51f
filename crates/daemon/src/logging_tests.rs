// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn write_bytes(path: &Path, size: u64) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![b'x'; size as usize]).unwrap();
}

fn config_in(dir: &Path) -> Config {
    Config::resolve(dir.to_path_buf(), None, |_| None).unwrap()
}

#[test]
fn startup_marker_appends_pid_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::write(&config.log_path, "earlier run\n").unwrap();

    write_startup_marker(&config).unwrap();

    let text = fs::read_to_string(&config.log_path).unwrap();
    let last = text.lines().last().unwrap();
    assert!(text.starts_with("earlier run\n"));
    assert_eq!(
        last,
        format!("{STARTUP_MARKER_PREFIX}{}) ---", std::process::id())
    );
}

#[test]
fn startup_error_is_written_synchronously() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    write_startup_error(&config, &LifecycleError::NoStateDir);

    let text = fs::read_to_string(&config.log_path).unwrap();
    assert_eq!(
        text,
        "ERROR Failed to start daemon: Could not determine state directory\n"
    );
}

#[test]
fn rotate_skips_small_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mjd.log");
    write_bytes(&log, 1024);

    rotate_log_if_needed(&log);

    assert!(log.exists(), "small log should not be rotated");
    assert!(!dir.path().join("mjd.log.1").exists());
}

#[test]
fn rotate_shifts_existing_rotations() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mjd.log");
    let rotated = |i: u32| -> PathBuf { dir.path().join(format!("mjd.log.{i}")) };
    write_bytes(&rotated(1), 100);
    write_bytes(&rotated(2), 200);
    write_bytes(&rotated(3), 300);
    write_bytes(&log, MAX_LOG_SIZE + 1);

    rotate_log_if_needed(&log);

    assert!(!log.exists());
    assert_eq!(fs::metadata(rotated(1)).unwrap().len(), MAX_LOG_SIZE + 1);
    assert_eq!(fs::metadata(rotated(2)).unwrap().len(), 100);
    // Oldest dropped: .3 now holds the old .2
    assert_eq!(fs::metadata(rotated(3)).unwrap().len(), 200);
}

#[test]
fn rotate_noop_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    rotate_log_if_needed(&dir.path().join("mjd.log"));
    assert!(!dir.path().join("mjd.log.1").exists());
}
