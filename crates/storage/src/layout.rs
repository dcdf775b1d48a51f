// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job directory layout.
//!
//! ```text
//! <jobs_root>/<job_name>/
//!   status.json
//!   log.jsonl
//!   workspace/
//!     prompt.md
//!     solution.tex
//!     solution.pdf
//! ```

use mj_core::JobName;
use std::path::{Path, PathBuf};

pub const STATUS_FILE: &str = "status.json";
pub const LOG_FILE: &str = "log.jsonl";
pub const WORKSPACE_DIR: &str = "workspace";
pub const PROMPT_FILE: &str = "prompt.md";
pub const SOLUTION_TEX: &str = "solution.tex";
pub const SOLUTION_PDF: &str = "solution.pdf";

/// Resolved paths for one job directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    job_dir: PathBuf,
}

impl JobPaths {
    pub fn new(jobs_dir: &Path, name: &JobName) -> Self {
        Self {
            job_dir: jobs_dir.join(name.as_str()),
        }
    }

    pub fn job_dir(&self) -> &Path {
        &self.job_dir
    }

    pub fn log_file(&self) -> PathBuf {
        self.job_dir.join(LOG_FILE)
    }

    pub fn workspace(&self) -> PathBuf {
        self.job_dir.join(WORKSPACE_DIR)
    }

    pub fn prompt_file(&self) -> PathBuf {
        self.workspace().join(PROMPT_FILE)
    }

    pub fn solution_tex(&self) -> PathBuf {
        self.workspace().join(SOLUTION_TEX)
    }

    pub fn solution_pdf(&self) -> PathBuf {
        self.workspace().join(SOLUTION_PDF)
    }
}
