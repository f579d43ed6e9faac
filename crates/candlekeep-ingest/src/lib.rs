//! Incremental kline ingestion worker and period scheduler.
//!
//! - [`ResumptionTracker`] - Where the next fetch of a series starts
//! - [`BatchFilter`] - Duplicate timestamp filtering within one fetch
//! - [`IngestWorker`] - One pass over all symbols for a period
//! - [`RunState`] - Shared progress of the current run
//! - [`Scheduler`] - Concurrent per-period dispatch and the run loop

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod filter;
mod run_state;
mod scheduler;
mod tracker;
mod worker;

pub use error::IngestError;
pub use filter::BatchFilter;
pub use run_state::{RunSnapshot, RunState};
pub use scheduler::{DEFAULT_POLL_INTERVAL, Dispatch, RunSummary, Scheduler, SchedulerConfig};
pub use tracker::{Cursor, ResumptionTracker};
pub use worker::{IngestWorker, PeriodReport, SkipReason, SymbolOutcome, WorkerConfig};
