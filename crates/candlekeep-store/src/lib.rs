//! SQLite kline store and symbol registry for the candlekeep collector.
//!
//! - [`KlineStore`] - Connection pool and schema setup
//! - [`StoreSession`] - One pooled connection used by a single ingestion pass
//! - [`StoredCandleRecord`] - A candle ready to be inserted
//! - [`IdGenerator`] - Clock-derived synthetic row ids

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod id;
pub mod queries;
mod record;
pub mod schema;
mod store;

pub use error::{Result, StoreError};
pub use id::IdGenerator;
pub use queries::SeriesSummary;
pub use record::StoredCandleRecord;
pub use store::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_POOL_SIZE, DbPool, KlineStore, StoreConfig, StoreSession,
};
