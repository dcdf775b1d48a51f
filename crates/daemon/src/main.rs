// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Math Jobs Daemon (mjd)
//!
//! Background process that runs math agent jobs found under the jobs
//! directory, at most `max_concurrent_jobs` at a time, until SIGTERM/SIGINT.

use mj_daemon::logging::{
    rotate_log_if_needed, setup_logging, write_startup_error, write_startup_marker,
};
use mj_daemon::{lifecycle, Config, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("mjd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("mjd {VERSION}");
                println!("Math Jobs Daemon - runs queued math agent jobs with bounded concurrency");
                println!();
                println!("USAGE:");
                println!("    mjd");
                println!();
                println!("Jobs are directories under the jobs directory holding a status.json");
                println!("in the `setup` state. The daemon picks them up on a periodic scan.");
                println!();
                println!("ENVIRONMENT:");
                println!("    MJ_STATE_DIR           State directory (default ~/.local/state/mj)");
                println!("    MJ_CONFIG              Config file (default <state_dir>/config.toml)");
                println!("    MJ_JOBS_DIR            Jobs directory (default <state_dir>/jobs)");
                println!("    MAX_CONCURRENT_JOBS    Worker count (default 2)");
                println!("    JOB_SCAN_INTERVAL      Seconds between scans (default 5)");
                println!("    PDFLATEX_COMMAND       LaTeX compiler (default pdflatex)");
                println!("    PDFLATEX_RUNS          Compiler passes (default 2)");
                println!("    MJ_TERMINATE_GRACE_MS  Grace period before SIGKILL (default 10000)");
                println!("    MJ_STALE_RUNNING       leave | error (default leave)");
                println!("    RUST_LOG               Log filter (default info)");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: mjd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);
    // Written before tracing setup so the marker is on disk immediately
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!("Starting daemon");

    let daemon = match lifecycle::startup(&config) {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("mjd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Daemon ready, watching {}",
        config.manager.jobs_dir.display()
    );
    // Signal ready for a parent process waiting on startup
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}
