//! Errors returned by kline fetches.

use candlekeep_util::DecompressError;
use thiserror::Error;

/// Errors that can occur while fetching klines.
///
/// None of these are fatal to the collector: the symbol is skipped for the
/// current run and fetched again on the next one.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure: DNS, connect, timeout or body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status.
    #[error("Server error: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Body is not valid JSON or not a kline array.
    #[error("Invalid kline payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Body looked gzip-compressed but could not be decompressed.
    #[error(transparent)]
    Decompress(#[from] DecompressError),

    /// The exchange answered with an `error_code` object.
    #[error("Exchange error_code {code}")]
    Exchange {
        /// The exchange's error code.
        code: String,
    },
}

impl FetchError {
    /// Returns true if the exchange rejected the request at application level.
    #[must_use]
    pub const fn is_exchange_error(&self) -> bool {
        matches!(self, Self::Exchange { .. })
    }
}
