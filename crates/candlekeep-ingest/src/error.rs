//! Errors that abort an ingestion pass.

use candlekeep_store::StoreError;
use candlekeep_types::Period;
use thiserror::Error;

/// Errors that abort a worker pass before every symbol was processed.
///
/// Fetch failures are not errors here; they skip the symbol and are
/// reported through [`SymbolOutcome`](crate::SymbolOutcome).
#[derive(Error, Debug)]
pub enum IngestError {
    /// A query, insert or commit failed. The period is not marked complete.
    #[error("Database failure while ingesting period {period}: {source}")]
    Database {
        /// The period whose pass was interrupted.
        period: Period,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// Returns the period the failed pass was for.
    #[must_use]
    pub const fn period(&self) -> Period {
        match self {
            Self::Database { period, .. } => *period,
        }
    }
}
