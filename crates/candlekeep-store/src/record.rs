//! Persisted form of a candle.

use candlekeep_types::{Candle, Period, Symbol};
use rust_decimal::Decimal;

/// A candle with the series identity it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCandleRecord {
    /// Synthetic row id, unrelated to the candle timestamp.
    pub id: i64,
    /// The trading pair, e.g. `ltc_btc`.
    pub symbol: String,
    /// Base currency code, e.g. `ltc`.
    pub base_currency: String,
    /// Quote currency code, e.g. `btc`.
    pub quote_currency: String,
    /// The kline period.
    pub period: Period,
    /// Bucket start in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Opening price.
    pub open: Decimal,
    /// Highest price.
    pub high: Decimal,
    /// Lowest price.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: Decimal,
}

impl StoredCandleRecord {
    /// Builds a record for `candle` in the `(symbol, period)` series.
    #[must_use]
    pub fn new(id: i64, symbol: &Symbol, period: Period, candle: &Candle) -> Self {
        Self {
            id,
            symbol: symbol.as_str().to_string(),
            base_currency: symbol.base().to_string(),
            quote_currency: symbol.quote().to_string(),
            period,
            timestamp: candle.timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_from_candle() {
        let symbol = Symbol::new("ltc_btc").unwrap();
        let candle = Candle::new(60_000, dec!(1), dec!(2), dec!(0.5), dec!(1.5), dec!(10));

        let record = StoredCandleRecord::new(42, &symbol, Period::Minute1, &candle);

        assert_eq!(record.id, 42);
        assert_eq!(record.symbol, "ltc_btc");
        assert_eq!(record.base_currency, "ltc");
        assert_eq!(record.quote_currency, "btc");
        assert_eq!(record.period, Period::Minute1);
        assert_eq!(record.timestamp, 60_000);
        assert_eq!(record.close, dec!(1.5));
    }
}
