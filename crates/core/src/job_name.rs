// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated job name.
//!
//! A job name doubles as its directory name under the jobs root, so it must
//! be a single path component.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rejected job name and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job name {name:?}: {reason}")]
pub struct InvalidJobName {
    pub name: String,
    pub reason: &'static str,
}

/// Unique name of a job, usable as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobName(String);

impl JobName {
    /// Validate and wrap a job name.
    pub fn parse(name: impl Into<String>) -> Result<Self, InvalidJobName> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.contains('/') || name.contains('\\') {
            Some("name contains a path separator")
        } else if name == "." || name == ".." {
            Some("name is a relative path component")
        } else if name.contains('\0') {
            Some("name contains a NUL byte")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(InvalidJobName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for JobName {
    type Error = InvalidJobName;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for JobName {
    type Error = InvalidJobName;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<JobName> for String {
    fn from(name: JobName) -> Self {
        name.0
    }
}

impl AsRef<str> for JobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JobName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JobName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for JobName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "job_name_tests.rs"]
mod tests;
