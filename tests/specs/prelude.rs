//! Test helpers for behavioral specifications.
//!
//! Provides an isolated daemon environment with scripted stand-ins for the
//! agent CLI and the LaTeX compiler.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::{BufRead, BufReader};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Returns the path to the mjd daemon binary.
pub fn mjd_binary() -> PathBuf {
    binary_path("mjd")
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Scripted tools
// =============================================================================

/// Agent that streams two events, writes a solution, and succeeds.
pub const SOLVING_AGENT: &str = r#"#!/bin/sh
echo '{"type":"system","subtype":"init","model":"claude-opus-4"}'
echo "plain progress text"
printf '%s\n' '\documentclass{article}\begin{document}x\end{document}' > solution.tex
echo '{"type":"result","subtype":"success","result":"done"}'
"#;

/// Agent that fails with exit code 3.
pub const FAILING_AGENT: &str = r#"#!/bin/sh
echo '{"type":"system","subtype":"init"}'
echo "quota exceeded" >&2
exit 3
"#;

/// Agent that never finishes on its own.
pub const HANGING_AGENT: &str = r#"#!/bin/sh
echo '{"type":"system","subtype":"init"}'
exec sleep 60
"#;

/// Compiler that produces `solution.pdf` and records each invocation.
pub const PDFLATEX: &str = r#"#!/bin/sh
echo run >> pdflatex.calls
echo '%PDF-1.5' > solution.pdf
"#;

// =============================================================================
// Daemon environment
// =============================================================================

/// Isolated state directory, jobs directory, and tool scripts.
pub struct DaemonEnv {
    state_dir: tempfile::TempDir,
    bin_dir: tempfile::TempDir,
    envs: Vec<(String, String)>,
}

impl DaemonEnv {
    pub fn new() -> Self {
        let env = Self {
            state_dir: tempfile::tempdir().unwrap(),
            bin_dir: tempfile::tempdir().unwrap(),
            envs: Vec::new(),
        };
        env.tool("pdflatex", PDFLATEX);
        env
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.state_path().join("jobs")
    }

    pub fn job_dir(&self, name: &str) -> PathBuf {
        self.jobs_dir().join(name)
    }

    /// Set an extra environment variable for the daemon.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    /// Install an executable script named `name` on the daemon's PATH.
    pub fn tool(&self, name: &str, script: &str) {
        let path = self.bin_dir.path().join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Create a job the way the submission layer does.
    pub fn job(&self, name: &str, status: &str, model: &str) {
        let dir = self.job_dir(name);
        std::fs::create_dir_all(dir.join("workspace")).unwrap();
        std::fs::write(dir.join("workspace/prompt.md"), "Solve exercise 6.\n").unwrap();
        let record = serde_json::json!({
            "status": status,
            "createdAt": "2025-06-28T08:41:51.000000Z",
            "model": model,
            "exercise": "ana2/blatt1_ex6",
            "disallowedTools": "",
        });
        std::fs::write(
            dir.join("status.json"),
            serde_json::to_string_pretty(&record).unwrap(),
        )
        .unwrap();
    }

    pub fn status(&self, name: &str) -> serde_json::Value {
        let text = std::fs::read_to_string(self.job_dir(name).join("status.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    pub fn status_is(&self, name: &str, expected: &str) -> bool {
        std::fs::read_to_string(self.job_dir(name).join("status.json"))
            .ok()
            .and_then(|t| serde_json::from_str::<serde_json::Value>(&t).ok())
            .is_some_and(|v| v["status"] == expected)
    }

    /// Parsed lines of the job's log.jsonl.
    pub fn log(&self, name: &str) -> Vec<serde_json::Value> {
        std::fs::read_to_string(self.job_dir(name).join("log.jsonl"))
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    /// Read the daemon log file contents (for debugging test failures)
    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("mjd.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(mjd_binary());
        let path = std::env::var("PATH").unwrap_or_default();
        cmd.env("PATH", format!("{}:{path}", self.bin_dir.path().display()))
            .env("MJ_STATE_DIR", self.state_path())
            .env("JOB_SCAN_INTERVAL", "1")
            .env("MJ_TERMINATE_GRACE_MS", "500")
            .env("RUST_LOG", "debug")
            .env_remove("MJ_CONFIG")
            .env_remove("MJ_JOBS_DIR");
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Start the daemon and wait for its READY line.
    pub fn start(&self) -> Daemon {
        let mut child = self
            .command()
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("mjd should start");
        let stdout = child.stdout.take().unwrap();
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        assert_eq!(
            line.trim(),
            "READY",
            "daemon did not become ready\n{}",
            self.daemon_log()
        );
        Daemon { child }
    }
}

/// Running daemon process; killed on drop if still alive.
pub struct Daemon {
    child: Child,
}

impl Daemon {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send SIGTERM and wait for the process to exit. Returns its exit status.
    pub fn terminate(mut self) -> std::process::ExitStatus {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM).unwrap();
        let mut status = None;
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || {
                status = self.child.try_wait().unwrap();
                status.is_some()
            }),
            "daemon did not exit after SIGTERM"
        );
        status.unwrap()
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
