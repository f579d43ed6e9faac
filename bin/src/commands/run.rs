//! Continuous collection, in the foreground or detached.

use super::build_worker;
use crate::config::{Config, data_dir};
use anyhow::{Context, Result};
use candlekeep_ingest::Scheduler;
use candlekeep_util::{Daemonizer, init_logging};
use std::path::Path;

/// Runs the collector loop until interrupted.
pub(crate) async fn run(config: &Config) -> Result<()> {
    let scheduler = Scheduler::new(build_worker(config).await?, config.scheduler_config(None));
    scheduler
        .init_total()
        .await
        .context("Failed to count stored klines")?;

    tracing::info!(
        periods = scheduler.config().periods.len(),
        poll_interval_secs = scheduler.config().poll_interval.as_secs(),
        "collector started"
    );

    scheduler.run_until(shutdown_signal()).await;
    Ok(())
}

/// Entry point of the detached process spawned by `run --background`.
///
/// Standard streams are closed, so logs always go to a file.
pub(crate) async fn daemon_run(mut config: Config) -> Result<()> {
    config
        .logging
        .directory
        .get_or_insert_with(|| data_dir().join("logs"));
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(pid = std::process::id(), "daemon process running");
    run(&config).await
}

/// Re-executes this binary detached from the terminal.
pub(crate) fn spawn_background(config_path: Option<&Path>, verbose: u8, config: &Config) -> Result<()> {
    let mut daemonizer = Daemonizer::new(&config.logging.exception_dir)
        .context("Failed to prepare background process")?;
    if let Some(path) = config_path {
        let path = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve config path '{}'", path.display()))?;
        daemonizer = daemonizer.arg("--config").arg(path);
    }
    for _ in 0..verbose {
        daemonizer = daemonizer.arg("-v");
    }

    let pid = daemonizer
        .spawn()
        .context("Failed to start background process")?;
    println!("candlekeep running in background (PID {pid})");
    println!(
        "PID marker written to {}",
        config.logging.exception_dir.display()
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
