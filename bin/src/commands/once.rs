//! Single ingestion pass.

use super::build_worker;
use crate::config::Config;
use anyhow::{Context, Result, bail};
use candlekeep_ingest::Scheduler;
use candlekeep_types::Period;

/// Runs one pass over `period`, or every configured period, and prints a summary.
pub(crate) async fn once(config: &Config, period: Option<Period>) -> Result<()> {
    let scheduler = Scheduler::new(build_worker(config).await?, config.scheduler_config(period));
    scheduler
        .init_total()
        .await
        .context("Failed to count stored klines")?;

    let mut summary = scheduler.run_once().await;
    summary.reports.sort_by_key(|report| report.period);

    println!("{:<8} {:>8} {:>8} {:>8} {:>10}", "PERIOD", "SYMBOLS", "INSERTED", "SKIPPED", "ELAPSED");
    println!("{}", "-".repeat(46));
    for report in &summary.reports {
        println!(
            "{:<8} {:>8} {:>8} {:>8} {:>9.1}s",
            report.period.as_str(),
            report.symbols.len(),
            report.inserted(),
            report.skipped(),
            report.elapsed.as_secs_f64()
        );
    }
    for (period, error) in &summary.failed {
        println!("{:<8} FAILED: {error}", period.as_str());
    }

    println!(
        "\nInserted: {}  Total stored: {}",
        summary.inserted(),
        scheduler.run_state().total()
    );

    if !summary.is_complete() {
        bail!("{} period(s) failed", summary.failed.len());
    }
    Ok(())
}
