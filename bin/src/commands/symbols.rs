//! Symbol registry management.

use super::open_store;
use crate::config::Config;
use anyhow::{Context, Result};
use candlekeep_types::Symbol;

/// Registers symbols given on the command line.
pub(crate) async fn add(config: &Config, raw: &[String]) -> Result<()> {
    let symbols = raw
        .iter()
        .map(|s| Symbol::new(s.to_lowercase()).with_context(|| format!("Invalid symbol '{s}'")))
        .collect::<Result<Vec<_>>>()?;

    let store = open_store(config)?;
    let requested = symbols.len();
    let added = store.session().await?.add_symbols(symbols).await?;

    println!("Registered {added} of {requested} symbol(s)");
    if added < requested {
        println!("{} already registered", requested - added);
    }
    Ok(())
}

/// Prints the registry in polling order.
pub(crate) async fn list(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let symbols = store.session().await?.symbols().await?;

    if symbols.is_empty() {
        println!("No symbols registered. Add some with `candlekeep symbols add ltc_btc`.");
        return Ok(());
    }

    println!("{:<14} {:<8} {:<8}", "SYMBOL", "BASE", "QUOTE");
    println!("{}", "-".repeat(32));
    for symbol in &symbols {
        println!("{:<14} {:<8} {:<8}", symbol.as_str(), symbol.base(), symbol.quote());
    }

    println!("\nTotal: {} symbols", symbols.len());
    Ok(())
}
