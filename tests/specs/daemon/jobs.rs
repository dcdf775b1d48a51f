//! Job execution specs
//!
//! Jobs written to the jobs directory are picked up by the scanner, run
//! through the scripted agent, and left in a terminal status.

use crate::prelude::*;

#[test]
#[serial_test::serial]
fn pending_job_runs_to_completion_with_pdf() {
    let env = DaemonEnv::new();
    env.tool("claude", SOLVING_AGENT);
    env.job("job_1", "setup", "claude-opus-4");
    let daemon = env.start();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || env.status_is("job_1", "completed")),
        "job did not complete\n{}",
        env.daemon_log()
    );

    let status = env.status("job_1");
    assert_eq!(status["solutionTexCreated"], true);
    assert_eq!(status["solutionPdfCreated"], true);
    assert_eq!(status["exercise"], "ana2/blatt1_ex6");
    assert!(status["startedAt"].is_string());
    assert!(status["completedAt"].is_string());

    let log = env.log("job_1");
    assert_eq!(log.len(), 3);
    assert_eq!(log[0]["subtype"], "init");
    assert_eq!(log[1]["type"], "system");
    assert_eq!(log[1]["content"], "plain progress text");
    assert_eq!(log[2]["result"], "done");

    let calls =
        std::fs::read_to_string(env.job_dir("job_1").join("workspace/pdflatex.calls")).unwrap();
    assert_eq!(calls.lines().count(), 2);

    daemon.terminate();
}

#[test]
#[serial_test::serial]
fn failing_agent_marks_error_with_exit_code() {
    let env = DaemonEnv::new();
    env.tool("claude", FAILING_AGENT);
    env.job("job_1", "setup", "claude-sonnet-4");
    let daemon = env.start();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || env.status_is("job_1", "error")),
        "{}",
        env.daemon_log()
    );
    let status = env.status("job_1");
    assert_eq!(status["error"], "Process exited with code 3");
    assert!(status["completedAt"].is_string());

    let log = env.log("job_1");
    assert_eq!(log.last().unwrap()["type"], "error");
    assert_eq!(log.last().unwrap()["content"], "Agent stderr: quota exceeded");

    daemon.terminate();
}

#[test]
#[serial_test::serial]
fn unknown_model_runs_default_tool() {
    let env = DaemonEnv::new();
    env.tool("gemini", SOLVING_AGENT);
    env.job("job_1", "setup", "some-new-model");
    let daemon = env.start();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || env.status_is("job_1", "completed")),
        "{}",
        env.daemon_log()
    );
    daemon.terminate();
}

#[test]
#[serial_test::serial]
fn missing_agent_binary_marks_error() {
    let env = DaemonEnv::new().env("PATH", "/nonexistent");
    env.job("job_1", "setup", "claude-opus-4");
    let daemon = env.start();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || env.status_is("job_1", "error")),
        "{}",
        env.daemon_log()
    );
    let error = env.status("job_1")["error"].as_str().unwrap().to_string();
    assert!(error.contains("failed to spawn claude"), "{error}");
    daemon.terminate();
}

#[test]
#[serial_test::serial]
fn sigterm_cancels_running_job_and_kills_agent() {
    let env = DaemonEnv::new();
    env.tool("claude", HANGING_AGENT);
    env.job("job_1", "setup", "claude-opus-4");
    let daemon = env.start();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || env.log("job_1").len() == 1),
        "{}",
        env.daemon_log()
    );
    assert!(env.status_is("job_1", "running"));

    let status = daemon.terminate();
    assert!(status.success(), "exit status: {status:?}");

    let status = env.status("job_1");
    assert_eq!(status["status"], "cancelled");
    assert!(status["completedAt"].is_string());
}

#[test]
#[serial_test::serial]
fn stale_running_job_is_left_or_marked_by_policy() {
    let env = DaemonEnv::new();
    env.tool("claude", SOLVING_AGENT);
    env.job("stale", "running", "claude-opus-4");
    env.job("fresh", "setup", "claude-opus-4");
    let daemon = env.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || env.status_is("fresh", "completed")));
    assert!(env.status_is("stale", "running"));
    daemon.terminate();

    let env = env.env("MJ_STALE_RUNNING", "error");
    let daemon = env.start();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || env.status_is("stale", "error")));
    assert_eq!(
        env.status("stale")["error"],
        "Interrupted by restart (startup recovery)"
    );
    daemon.terminate();
}
