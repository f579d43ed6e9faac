//! CLI command implementations.

pub(crate) mod once;
pub(crate) mod periods;
pub(crate) mod run;
pub(crate) mod status;
pub(crate) mod symbols;

use crate::config::Config;
use anyhow::{Context, Result};
use candlekeep_fetch::KlineClient;
use candlekeep_ingest::{IngestWorker, RunState};
use candlekeep_store::KlineStore;
use std::sync::Arc;

/// Opens the kline database named by the configuration.
pub(crate) fn open_store(config: &Config) -> Result<KlineStore> {
    let store_config = config.store_config();
    KlineStore::open(&store_config).with_context(|| {
        format!(
            "Failed to open kline database '{}'",
            store_config.path.display()
        )
    })
}

/// Opens the store, registers configured symbols and builds the worker.
pub(crate) async fn build_worker(config: &Config) -> Result<IngestWorker> {
    let store = open_store(config)?;

    if !config.symbols.is_empty() {
        let mut session = store.session().await?;
        let added = session
            .add_symbols(config.symbols.clone())
            .await
            .context("Failed to register configured symbols")?;
        if added > 0 {
            tracing::info!(added, "registered configured symbols");
        }
    }

    let client = KlineClient::new(config.client_config()).context("Failed to create HTTP client")?;
    Ok(IngestWorker::new(
        Arc::new(client),
        store,
        Arc::new(RunState::new()),
        config.worker_config(),
    ))
}
