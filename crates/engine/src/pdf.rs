// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LaTeX to PDF compilation of a finished job's solution

use crate::config::ExecutorConfig;
use crate::stream::preview;
use mj_adapters::{CommandSpec, ProcessAdapter};
use mj_core::LogEntry;
use mj_storage::{LogSink, SOLUTION_PDF, SOLUTION_TEX};
use std::path::Path;

/// Characters of compiler output kept in the failure log entry
const FAILURE_PREVIEW_CHARS: usize = 500;

/// Compile `solution.tex` in `workspace`.
///
/// The compiler runs once; only if that run exits 0 is it repeated up to
/// `pdflatex_runs` total, to settle cross-references. The result is whether
/// `solution.pdf` exists afterwards, since the exit code alone is not
/// reliable. Failures never propagate: they are logged and yield `false`.
pub async fn compile_pdf<P: ProcessAdapter>(
    processes: &P,
    config: &ExecutorConfig,
    workspace: &Path,
    sink: &LogSink,
) -> bool {
    let spec = CommandSpec::new(&config.pdflatex_command, workspace)
        .args(config.pdflatex_args.iter().cloned())
        .arg(SOLUTION_TEX);

    let first = match processes.run(&spec, config.pdf_timeout).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(error = %e, "PDF compilation failed");
            sink.append_or_warn(&LogEntry::error(format!("LaTeX compilation failed: {e}")));
            return false;
        }
    };

    if !first.success() {
        let stderr = String::from_utf8_lossy(&first.stderr);
        let detail = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&first.stdout)
        } else {
            stderr
        };
        tracing::warn!(code = first.code, "pdflatex exited with failure");
        sink.append_or_warn(&LogEntry::error(format!(
            "LaTeX compilation failed: {}",
            preview(&detail, FAILURE_PREVIEW_CHARS)
        )));
        return false;
    }

    for run in 2..=config.pdflatex_runs {
        match processes.run(&spec, config.pdf_timeout).await {
            Ok(output) if !output.success() => {
                tracing::warn!(run, code = output.code, "pdflatex rerun failed")
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(run, error = %e, "pdflatex rerun failed"),
        }
    }

    workspace.join(SOLUTION_PDF).exists()
}

#[cfg(test)]
#[path = "pdf_tests.rs"]
mod tests;
