//! Stored data overview.

use super::open_store;
use crate::config::Config;
use anyhow::Result;
use candlekeep_util::time::locale_date_str_ms;

/// Prints the row count and latest candle of every stored series.
pub(crate) async fn status(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let mut session = store.session().await?;
    let total = session.total_count().await?;
    let symbols = session.symbols().await?;
    let series = session.series_summaries().await?;

    println!("Database: {}", store.path().display());
    println!("Symbols:  {}", symbols.len());
    println!("Klines:   {total}");

    if series.is_empty() {
        println!("\nNo klines stored yet.");
        return Ok(());
    }

    println!();
    println!("{:<14} {:<8} {:>10}  {:<26}", "SYMBOL", "PERIOD", "ROWS", "LATEST");
    println!("{}", "-".repeat(62));
    for entry in &series {
        println!(
            "{:<14} {:<8} {:>10}  {:<26}",
            entry.symbol,
            entry.period,
            entry.rows,
            locale_date_str_ms(entry.latest_timestamp)
        );
    }
    Ok(())
}
