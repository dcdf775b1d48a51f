// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mj_adapters::{FakeProcessAdapter, FakeProgram, ProcessCall};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

struct Setup {
    _dir: TempDir,
    workspace: std::path::PathBuf,
    sink: LogSink,
    fake: FakeProcessAdapter,
}

fn setup() -> Setup {
    let dir = tempdir().unwrap();
    let workspace = dir.path().join("workspace");
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::write(workspace.join("solution.tex"), "\\documentclass{article}").unwrap();
    Setup {
        sink: LogSink::new(dir.path().join("log.jsonl")),
        workspace,
        _dir: dir,
        fake: FakeProcessAdapter::new(),
    }
}

#[tokio::test]
async fn successful_compile_runs_twice_and_checks_pdf() {
    let s = setup();
    s.fake.script(
        "pdflatex",
        FakeProgram::exits(0).creates("solution.pdf", "%PDF"),
    );

    let ok = compile_pdf(&s.fake, &ExecutorConfig::default(), &s.workspace, &s.sink).await;

    assert!(ok);
    assert_eq!(s.fake.invocations("pdflatex"), 2);
    let calls = s.fake.calls();
    let ProcessCall::Run { spec, timeout } = &calls[0] else {
        panic!("expected run call");
    };
    assert_eq!(spec.args, vec!["-interaction=nonstopmode", "solution.tex"]);
    assert_eq!(spec.cwd, s.workspace);
    assert_eq!(*timeout, Duration::from_secs(120));
    assert!(s.sink.read_entries().unwrap().is_empty());
}

#[yare::parameterized(
    single = { 1, 1 },
    triple = { 3, 3 },
)]
fn run_count_follows_config(runs: u32, expected: usize) {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(async {
            let s = setup();
            s.fake.script(
                "pdflatex",
                FakeProgram::exits(0).creates("solution.pdf", "%PDF"),
            );
            let config = ExecutorConfig {
                pdflatex_runs: runs,
                ..ExecutorConfig::default()
            };
            assert!(compile_pdf(&s.fake, &config, &s.workspace, &s.sink).await);
            assert_eq!(s.fake.invocations("pdflatex"), expected);
        });
}

#[tokio::test]
async fn exit_zero_without_pdf_is_failure() {
    let s = setup();
    s.fake.script("pdflatex", FakeProgram::exits(0));

    assert!(!compile_pdf(&s.fake, &ExecutorConfig::default(), &s.workspace, &s.sink).await);
    assert_eq!(s.fake.invocations("pdflatex"), 2);
}

#[tokio::test]
async fn nonzero_exit_logs_truncated_stderr_and_skips_rerun() {
    let s = setup();
    s.fake.script(
        "pdflatex",
        FakeProgram::exits(1).stderr("E".repeat(2000)),
    );

    assert!(!compile_pdf(&s.fake, &ExecutorConfig::default(), &s.workspace, &s.sink).await);
    assert_eq!(s.fake.invocations("pdflatex"), 1);

    let entries = s.sink.read_entries().unwrap();
    assert_eq!(entries.len(), 1);
    match &entries[0] {
        LogEntry::Error { content, .. } => {
            assert_eq!(
                content,
                &format!("LaTeX compilation failed: {}", "E".repeat(500))
            );
        }
        other => panic!("expected error entry, got {other:?}"),
    }
}

#[tokio::test]
async fn nonzero_exit_falls_back_to_stdout() {
    let s = setup();
    s.fake.script(
        "pdflatex",
        FakeProgram::exits(1).stdout_line("! Undefined control sequence."),
    );

    compile_pdf(&s.fake, &ExecutorConfig::default(), &s.workspace, &s.sink).await;

    let entries = s.sink.read_entries().unwrap();
    assert!(
        matches!(&entries[0], LogEntry::Error { content, .. } if content.contains("Undefined control sequence")),
        "got {entries:?}"
    );
}

#[tokio::test]
async fn missing_compiler_is_false_not_error() {
    let s = setup();
    // Nothing scripted: spawning pdflatex fails

    assert!(!compile_pdf(&s.fake, &ExecutorConfig::default(), &s.workspace, &s.sink).await);
    assert_eq!(s.sink.read_entries().unwrap().len(), 1);
}

#[tokio::test]
async fn compiler_timeout_is_false() {
    let s = setup();
    s.fake.script("pdflatex", FakeProgram::hangs());
    assert!(!compile_pdf(&s.fake, &ExecutorConfig::default(), &s.workspace, &s.sink).await);
}
