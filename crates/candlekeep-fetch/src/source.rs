//! Kline source abstraction.

use crate::FetchError;
use async_trait::async_trait;
use candlekeep_types::{Candle, Period, Symbol};

/// Maximum number of candles requested per call unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 2000;

/// Parameters of a single kline fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    /// The trading pair.
    pub symbol: Symbol,
    /// The kline period.
    pub period: Period,
    /// Start of the requested window in milliseconds; `None` asks for the latest window.
    pub since: Option<i64>,
    /// Maximum number of candles to return.
    pub size: u32,
}

impl KlineRequest {
    /// Creates a request for the most recent window with the default page size.
    #[must_use]
    pub const fn new(symbol: Symbol, period: Period) -> Self {
        Self {
            symbol,
            period,
            since: None,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the start of the requested window.
    #[must_use]
    pub const fn with_since(mut self, since: Option<i64>) -> Self {
        self.since = since;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Returns the `since` query value, empty when no cursor is set.
    #[must_use]
    pub fn since_param(&self) -> String {
        self.since.map(|s| s.to_string()).unwrap_or_default()
    }
}

/// Something that can return klines for a request.
///
/// Implemented by [`KlineClient`](crate::KlineClient) for the live exchange;
/// tests substitute scripted sources.
#[async_trait]
pub trait KlineSource: Send + Sync {
    /// Fetches candles in exchange order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport, decode, or exchange-level failure.
    async fn fetch_klines(&self, request: &KlineRequest) -> Result<Vec<Candle>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_param() {
        let request = KlineRequest::new(Symbol::new("ltc_btc").unwrap(), Period::Day1);
        assert_eq!(request.since_param(), "");
        assert_eq!(request.size, 2000);
        let request = request.with_since(Some(86_400_000)).with_size(100);
        assert_eq!(request.since_param(), "86400000");
        assert_eq!(request.size, 100);
    }
}
