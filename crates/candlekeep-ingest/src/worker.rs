//! One ingestion pass over every registered symbol for a single period.

use crate::{BatchFilter, IngestError, ResumptionTracker, RunState};
use candlekeep_fetch::{DEFAULT_PAGE_SIZE, FetchError, KlineRequest, KlineSource};
use candlekeep_store::{KlineStore, StoreError, StoreSession, StoredCandleRecord};
use candlekeep_types::{Period, Symbol};
use candlekeep_util::time::locale_date_str_ms;
use candlekeep_util::{DEFAULT_EXCEPTION_DIR, program_name, write_exception_log};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Settings for [`IngestWorker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Candles requested per fetch.
    pub page_size: u32,
    /// Directory receiving exception reports.
    pub exception_dir: PathBuf,
    /// Program name used in exception report file names.
    pub program: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            exception_dir: PathBuf::from(DEFAULT_EXCEPTION_DIR),
            program: program_name(),
        }
    }
}

/// Why a symbol was skipped for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Transport, status or decode failure.
    Fetch(String),
    /// The exchange answered with an error code.
    Exchange {
        /// The exchange's error code.
        code: String,
    },
}

/// Result of ingesting one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOutcome {
    /// The fetched batch was committed.
    Inserted {
        /// Candles stored.
        inserted: usize,
        /// Candles dropped as duplicates.
        duplicates: usize,
    },
    /// Nothing was fetched; the symbol is retried next run.
    Skipped(SkipReason),
}

impl SymbolOutcome {
    /// Candles stored for this symbol.
    #[must_use]
    pub const fn inserted(&self) -> usize {
        match self {
            Self::Inserted { inserted, .. } => *inserted,
            Self::Skipped(_) => 0,
        }
    }

    /// Returns true if the symbol was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Summary of a completed worker pass.
#[derive(Debug, Clone)]
pub struct PeriodReport {
    /// The period ingested.
    pub period: Period,
    /// The run the pass belonged to.
    pub run_id: u64,
    /// Per-symbol outcomes in registry order.
    pub symbols: Vec<(Symbol, SymbolOutcome)>,
    /// Whether this pass was the last period of its run to complete.
    pub finished_run: bool,
    /// Wall time of the pass.
    pub elapsed: Duration,
}

impl PeriodReport {
    /// Candles stored during the pass.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.symbols.iter().map(|(_, outcome)| outcome.inserted()).sum()
    }

    /// Number of symbols skipped during the pass.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.symbols.iter().filter(|(_, outcome)| outcome.is_skipped()).count()
    }
}

/// Fetches and stores new candles for one period across all symbols.
#[derive(Clone)]
pub struct IngestWorker {
    source: Arc<dyn KlineSource>,
    store: KlineStore,
    run_state: Arc<RunState>,
    config: WorkerConfig,
}

impl std::fmt::Debug for IngestWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestWorker")
            .field("store", &self.store)
            .field("run_state", &self.run_state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IngestWorker {
    /// Creates a worker.
    #[must_use]
    pub fn new(
        source: Arc<dyn KlineSource>,
        store: KlineStore,
        run_state: Arc<RunState>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            source,
            store,
            run_state,
            config,
        }
    }

    /// Returns the shared run state.
    #[must_use]
    pub const fn run_state(&self) -> &Arc<RunState> {
        &self.run_state
    }

    /// Returns the store.
    #[must_use]
    pub const fn store(&self) -> &KlineStore {
        &self.store
    }

    /// Runs one pass over every registered symbol for `period`.
    ///
    /// Symbols whose fetch fails are skipped. On success the period is
    /// marked complete for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Database`] if a store operation fails. The
    /// error is written to the exception log and the period is left
    /// pending for the run.
    #[tracing::instrument(name = "ingest_period", skip(self, period), fields(period = %period))]
    pub async fn run(&self, period: Period, run_id: u64) -> Result<PeriodReport, IngestError> {
        let started = Instant::now();
        tracing::info!("period pass started");

        let symbols = match self.pass(period, run_id).await {
            Ok(symbols) => symbols,
            Err(source) => {
                let error = IngestError::Database { period, source };
                write_exception_log(&self.config.exception_dir, &self.config.program, &error);
                let snapshot = self.run_state.snapshot();
                tracing::warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    done = ?snapshot.done,
                    pending = ?snapshot.pending,
                    total = snapshot.total,
                    "period pass aborted"
                );
                return Err(error);
            }
        };

        let finished_run = self.run_state.complete_period(run_id, period);
        let report = PeriodReport {
            period,
            run_id,
            symbols,
            finished_run,
            elapsed: started.elapsed(),
        };

        let snapshot = self.run_state.snapshot();
        tracing::info!(
            inserted = report.inserted(),
            skipped = report.skipped(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            done = ?snapshot.done,
            pending = ?snapshot.pending,
            total = snapshot.total,
            runs_completed = snapshot.runs_completed,
            "period pass finished"
        );
        Ok(report)
    }

    async fn pass(
        &self,
        period: Period,
        run_id: u64,
    ) -> Result<Vec<(Symbol, SymbolOutcome)>, StoreError> {
        // Dropping the session on any exit path returns the connection to the pool
        let mut session = self.store.session().await?;
        let symbols = session.symbols().await?;
        let count = symbols.len();

        let mut outcomes = Vec::with_capacity(count);
        for (index, symbol) in symbols.into_iter().enumerate() {
            tracing::debug!(%symbol, position = index + 1, of = count, "ingesting symbol");
            let outcome = self.ingest_symbol(&mut session, &symbol, period).await?;
            self.run_state.record_inserted(run_id, outcome.inserted() as u64);
            outcomes.push((symbol, outcome));
        }
        Ok(outcomes)
    }

    /// Fetches and commits the next window of one series.
    ///
    /// # Errors
    ///
    /// Returns an error only for store failures; fetch failures become
    /// [`SymbolOutcome::Skipped`].
    pub async fn ingest_symbol(
        &self,
        session: &mut StoreSession,
        symbol: &Symbol,
        period: Period,
    ) -> Result<SymbolOutcome, StoreError> {
        let cursor = ResumptionTracker::next_since(session, symbol, period).await?;
        if cursor.last_timestamp != 0 {
            tracing::debug!(
                %symbol,
                last = %locale_date_str_ms(cursor.last_timestamp),
                since = %cursor.since_param(),
                "resuming series"
            );
        }

        let request = KlineRequest::new(symbol.clone(), period)
            .with_since(cursor.since)
            .with_size(self.config.page_size);

        let candles = match self.source.fetch_klines(&request).await {
            Ok(candles) => candles,
            Err(FetchError::Exchange { code }) => {
                tracing::error!(%symbol, %code, "exchange rejected kline request, skipping symbol");
                return Ok(SymbolOutcome::Skipped(SkipReason::Exchange { code }));
            }
            Err(e) => {
                write_exception_log(&self.config.exception_dir, &self.config.program, &e);
                tracing::warn!(%symbol, "kline fetch failed, skipping symbol");
                return Ok(SymbolOutcome::Skipped(SkipReason::Fetch(e.to_string())));
            }
        };

        if let Some(first) = candles.first() {
            tracing::debug!(
                %symbol,
                fetched = candles.len(),
                first = %locale_date_str_ms(first.timestamp),
                "klines fetched"
            );
        }

        let mut filter = BatchFilter::new(cursor.last_timestamp);
        let mut records = Vec::with_capacity(candles.len());
        for candle in &candles {
            if filter.accept(candle.timestamp) {
                records.push(StoredCandleRecord::new(session.next_id(), symbol, period, candle));
            } else {
                tracing::debug!(
                    %symbol,
                    timestamp = candle.timestamp,
                    at = %locale_date_str_ms(candle.timestamp),
                    "duplicated timestamp"
                );
            }
        }

        let duplicates = candles.len() - filter.accepted();
        let inserted = session.insert_batch(records).await?;
        tracing::info!(%symbol, inserted, duplicates, "batch committed");

        Ok(SymbolOutcome::Inserted {
            inserted,
            duplicates,
        })
    }
}
