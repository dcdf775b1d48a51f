// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Math Jobs Daemon library
//!
//! Configuration and lifecycle of the `mjd` job daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod logging;

pub use config::Config;
pub use lifecycle::{startup, startup_with, Daemon, DaemonProcesses, LifecycleError};
