//! Concurrent per-period dispatch and the run loop.

use crate::{IngestError, IngestWorker, PeriodReport, RunState};
use candlekeep_store::StoreError;
use candlekeep_types::Period;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How often the run loop checks for a completed run.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Settings for [`Scheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Periods dispatched in every run.
    pub periods: Vec<Period>,
    /// Interval between completion checks.
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            periods: Period::all().to_vec(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

type PeriodHandle = JoinHandle<Result<PeriodReport, IngestError>>;

/// Period tasks spawned for one run.
///
/// Dropping a dispatch detaches its tasks; they run to completion.
#[derive(Debug)]
pub struct Dispatch {
    run_id: u64,
    handles: Vec<(Period, PeriodHandle)>,
}

impl Dispatch {
    /// The run these tasks belong to.
    #[must_use]
    pub const fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Periods with a task in this dispatch.
    #[must_use]
    pub fn periods(&self) -> Vec<Period> {
        self.handles.iter().map(|(period, _)| *period).collect()
    }

    /// Returns true once every task has finished, successfully or not.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Waits for every task and collects the outcomes.
    pub async fn join(self) -> RunSummary {
        let (periods, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut summary = RunSummary {
            run_id: self.run_id,
            reports: Vec::new(),
            failed: Vec::new(),
        };
        for (period, result) in periods.into_iter().zip(results) {
            match result {
                Ok(Ok(report)) => summary.reports.push(report),
                Ok(Err(e)) => summary.failed.push((period, e.to_string())),
                Err(e) => {
                    tracing::error!(%period, error = %e, "period task did not finish");
                    summary.failed.push((period, e.to_string()));
                }
            }
        }
        summary
    }
}

/// Outcome of every period task of a dispatch.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The run id.
    pub run_id: u64,
    /// Reports of periods that completed.
    pub reports: Vec<PeriodReport>,
    /// Periods whose pass was aborted, with the error message.
    pub failed: Vec<(Period, String)>,
}

impl RunSummary {
    /// Candles stored across all completed periods.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.reports.iter().map(PeriodReport::inserted).sum()
    }

    /// Returns true if no period failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs one worker per period and starts a new run when the last one completes.
#[derive(Debug)]
pub struct Scheduler {
    worker: Arc<IngestWorker>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Creates a scheduler around `worker`.
    #[must_use]
    pub fn new(worker: IngestWorker, config: SchedulerConfig) -> Self {
        Self {
            worker: Arc::new(worker),
            config,
        }
    }

    /// The shared run state.
    #[must_use]
    pub fn run_state(&self) -> &Arc<RunState> {
        self.worker.run_state()
    }

    /// The scheduler settings.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Seeds the cumulative total from the stored row count.
    ///
    /// Called once at process start.
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    pub async fn init_total(&self) -> Result<u64, StoreError> {
        let mut session = self.worker.store().session().await?;
        let total = session.total_count().await?;
        self.run_state().set_total(total);
        tracing::info!(total, "stored klines at startup");
        Ok(total)
    }

    /// Starts a new run with one task per configured period.
    pub fn dispatch(&self) -> Dispatch {
        let run_id = self.run_state().begin_run(&self.config.periods);
        tracing::info!(run_id, periods = self.config.periods.len(), "dispatching run");
        self.spawn_periods(run_id, &self.config.periods)
    }

    fn spawn_periods(&self, run_id: u64, periods: &[Period]) -> Dispatch {
        let handles = periods
            .iter()
            .map(|&period| {
                let worker = Arc::clone(&self.worker);
                let handle = tokio::spawn(async move { worker.run(period, run_id).await });
                (period, handle)
            })
            .collect();
        Dispatch { run_id, handles }
    }

    /// Runs every period once and waits for all of them.
    pub async fn run_once(&self) -> RunSummary {
        self.dispatch().join().await
    }

    /// Runs until the process is terminated.
    pub async fn run_forever(&self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Runs until `shutdown` resolves.
    ///
    /// Every poll interval the loop checks whether the completed-run count
    /// advanced and, if so, dispatches the next run immediately. When every
    /// task of the current run has finished but some periods failed, those
    /// periods are dispatched again within the same run. Running tasks are
    /// never cancelled.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if self.config.periods.is_empty() {
            tracing::warn!("no periods configured, scheduler idle");
            return;
        }

        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.config.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut runs_seen = self.run_state().runs_completed();
        let mut dispatch = self.dispatch();

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!(run_id = dispatch.run_id(), "scheduler stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let runs = self.run_state().runs_completed();
            if runs > runs_seen {
                runs_seen = runs;
                let snapshot = self.run_state().snapshot();
                tracing::info!(
                    run_id = dispatch.run_id(),
                    runs_completed = runs,
                    inserted = snapshot.inserted,
                    total = snapshot.total,
                    "run complete"
                );
                dispatch = self.dispatch();
            } else if dispatch.is_finished() {
                let pending = self.run_state().pending();
                if !pending.is_empty() {
                    tracing::warn!(run_id = dispatch.run_id(), ?pending, "re-dispatching failed periods");
                    dispatch = self.spawn_periods(dispatch.run_id(), &pending);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkerConfig;
    use async_trait::async_trait;
    use candlekeep_fetch::{FetchError, KlineRequest, KlineSource};
    use candlekeep_store::{KlineStore, StoreConfig};
    use candlekeep_types::{Candle, Symbol};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    struct OneCandle;

    #[async_trait]
    impl KlineSource for OneCandle {
        async fn fetch_klines(&self, request: &KlineRequest) -> Result<Vec<Candle>, FetchError> {
            let ts = request.since.unwrap_or(0) + 1;
            Ok(vec![Candle::new(ts, dec!(1), dec!(1), dec!(1), dec!(1), dec!(1))])
        }
    }

    async fn scheduler(dir: &TempDir, periods: Vec<Period>) -> Scheduler {
        let store = KlineStore::open(&StoreConfig::new(dir.path().join("klines.db"))).unwrap();
        store
            .session()
            .await
            .unwrap()
            .add_symbols(vec![Symbol::new("ltc_btc").unwrap()])
            .await
            .unwrap();
        let config = WorkerConfig {
            exception_dir: dir.path().join("exlog"),
            ..WorkerConfig::default()
        };
        let worker = IngestWorker::new(Arc::new(OneCandle), store, Arc::new(RunState::new()), config);
        Scheduler::new(
            worker,
            SchedulerConfig {
                periods,
                poll_interval: Duration::from_millis(10),
            },
        )
    }

    #[tokio::test]
    async fn test_run_once_covers_every_period() {
        let dir = TempDir::new().unwrap();
        let scheduler = scheduler(&dir, Period::all().to_vec()).await;
        assert_eq!(scheduler.init_total().await.unwrap(), 0);

        let summary = scheduler.run_once().await;

        assert!(summary.is_complete());
        assert_eq!(summary.reports.len(), Period::all().len());
        assert_eq!(summary.inserted(), Period::all().len());
        assert_eq!(scheduler.run_state().runs_completed(), 1);
        assert_eq!(scheduler.run_state().total(), Period::all().len() as u64);
        assert_eq!(summary.reports.iter().filter(|r| r.finished_run).count(), 1);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let scheduler = scheduler(&dir, vec![Period::Minute1]).await;

        scheduler.run_until(async {}).await;

        assert_eq!(scheduler.run_state().current_run(), 1);
    }

    #[tokio::test]
    async fn test_empty_period_list_is_idle() {
        let dir = TempDir::new().unwrap();
        let scheduler = scheduler(&dir, Vec::new()).await;

        scheduler.run_forever().await;

        assert_eq!(scheduler.run_state().current_run(), 0);
    }
}
