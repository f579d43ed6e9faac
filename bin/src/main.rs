//! candlekeep CLI - incremental exchange kline collector.

use anyhow::{Context, Result};
use candlekeep_types::Period;
use candlekeep_util::init_logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "candlekeep")]
#[command(about = "Incremental exchange kline collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Hidden: run the collector loop as a detached daemon (internal use only)
    #[arg(long, hide = true)]
    daemon_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect klines for every period, forever (default)
    Run {
        /// Detach and run in the background
        #[arg(long)]
        background: bool,
    },

    /// Make a single ingestion pass and exit
    Once {
        /// Only ingest this period (e.g. 1min, 4hour, 1week)
        #[arg(short, long)]
        period: Option<Period>,
    },

    /// Show stored row counts and the latest candle per series
    Status,

    /// List the period catalog
    Periods,

    /// Manage the symbol registry
    Symbols {
        #[command(subcommand)]
        action: SymbolsAction,
    },
}

/// Symbol registry actions.
#[derive(Subcommand)]
enum SymbolsAction {
    /// Register symbols such as ltc_btc
    Add {
        /// Symbols in <base>_<quote> form
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// List registered symbols
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    match cli.verbose {
        0 => {}
        1 => config.logging.level = "debug".to_string(),
        _ => config.logging.level = "trace".to_string(),
    }

    // Check for daemon mode first (internal use)
    if cli.daemon_run {
        return commands::run::daemon_run(config).await;
    }

    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command.unwrap_or(Commands::Run { background: false }) {
        Commands::Run { background: true } => {
            commands::run::spawn_background(cli.config.as_deref(), cli.verbose, &config)
        }
        Commands::Run { background: false } => commands::run::run(&config).await,
        Commands::Once { period } => commands::once::once(&config, period).await,
        Commands::Status => commands::status::status(&config).await,
        Commands::Periods => {
            commands::periods::list_periods();
            Ok(())
        }
        Commands::Symbols { action } => match action {
            SymbolsAction::Add { symbols } => commands::symbols::add(&config, &symbols).await,
            SymbolsAction::List => commands::symbols::list(&config).await,
        },
    }
}
