//! Progress shared by the period tasks of a run.

use candlekeep_types::Period;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Progress of the current run plus process-wide counters.
///
/// Per-run state sits behind a mutex that is only held for small updates;
/// the cumulative candle total and the completed-run count are atomics.
/// Updates carrying the id of an earlier run are ignored for per-run state.
#[derive(Debug, Default)]
pub struct RunState {
    current: Mutex<RunProgress>,
    total: AtomicU64,
    runs_completed: AtomicU64,
}

#[derive(Debug, Default)]
struct RunProgress {
    run_id: u64,
    expected: usize,
    done: BTreeSet<Period>,
    pending: BTreeSet<Period>,
    inserted: u64,
    completed: bool,
}

/// Point-in-time copy of [`RunState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    /// Id of the current run, `0` before the first dispatch.
    pub run_id: u64,
    /// Periods completed in the current run, in catalog order.
    pub done: Vec<Period>,
    /// Periods not yet completed in the current run, in catalog order.
    pub pending: Vec<Period>,
    /// Candles inserted during the current run.
    pub inserted: u64,
    /// Candles stored since process start, including the startup count.
    pub total: u64,
    /// Number of runs in which every period completed.
    pub runs_completed: u64,
}

impl RunState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn progress(&self) -> MutexGuard<'_, RunProgress> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds the cumulative total, normally with the stored row count at startup.
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Candles stored since process start, including the startup count.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Number of runs in which every period completed.
    #[must_use]
    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Acquire)
    }

    /// Starts a new run over `periods` and returns its id.
    ///
    /// Clears the completed and pending sets and the per-run counter.
    pub fn begin_run(&self, periods: &[Period]) -> u64 {
        let mut progress = self.progress();
        let run_id = progress.run_id + 1;
        let pending: BTreeSet<Period> = periods.iter().copied().collect();
        *progress = RunProgress {
            run_id,
            expected: pending.len(),
            done: BTreeSet::new(),
            pending,
            inserted: 0,
            completed: false,
        };
        run_id
    }

    /// Id of the current run.
    #[must_use]
    pub fn current_run(&self) -> u64 {
        self.progress().run_id
    }

    /// Adds committed candles to the counters.
    ///
    /// The cumulative total always grows; the per-run counter only for the current run.
    pub fn record_inserted(&self, run_id: u64, inserted: u64) {
        if inserted == 0 {
            return;
        }
        self.total.fetch_add(inserted, Ordering::Relaxed);
        let mut progress = self.progress();
        if progress.run_id == run_id {
            progress.inserted += inserted;
        }
    }

    /// Marks `period` complete for `run_id`.
    ///
    /// Returns true if this completion finished the run, in which case the
    /// completed-run count has been incremented. A run is counted once no
    /// matter how many completions arrive afterwards.
    pub fn complete_period(&self, run_id: u64, period: Period) -> bool {
        let mut progress = self.progress();
        if progress.run_id != run_id {
            tracing::debug!(run_id, current = progress.run_id, %period, "ignoring completion of stale run");
            return false;
        }

        progress.pending.remove(&period);
        progress.done.insert(period);

        if progress.completed || progress.done.len() < progress.expected {
            return false;
        }
        progress.completed = true;
        self.runs_completed.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Returns true once every period of `run_id` has completed.
    #[must_use]
    pub fn is_run_complete(&self, run_id: u64) -> bool {
        let progress = self.progress();
        progress.run_id == run_id && progress.completed
    }

    /// Periods of the current run not yet completed.
    #[must_use]
    pub fn pending(&self) -> Vec<Period> {
        self.progress().pending.iter().copied().collect()
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        let progress = self.progress();
        RunSnapshot {
            run_id: progress.run_id,
            done: progress.done.iter().copied().collect(),
            pending: progress.pending.iter().copied().collect(),
            inserted: progress.inserted,
            total: self.total(),
            runs_completed: self.runs_completed(),
        }
    }
}
