//! Resumption cursor for a `(symbol, period)` series.

use candlekeep_store::{StoreError, StoreSession};
use candlekeep_types::{Period, Symbol, period_duration_ms};

/// Where the next fetch of a series starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Start of the next window in milliseconds; `None` fetches the most recent window.
    pub since: Option<i64>,
    /// Latest stored timestamp, `0` when the series is empty.
    pub last_timestamp: i64,
}

impl Cursor {
    /// Builds the cursor following the latest stored candle of a series.
    ///
    /// With a stored candle at `T` the next window starts at
    /// `T + duration(period)`. An unknown period duration resolves to zero,
    /// which leaves the window starting at `T`.
    #[must_use]
    pub fn resume(latest: Option<i64>, period: Period) -> Self {
        match latest {
            None => Self::default(),
            Some(last_timestamp) => {
                let step = i64::try_from(period_duration_ms(period.as_str())).unwrap_or(0);
                Self {
                    since: Some(last_timestamp.saturating_add(step)),
                    last_timestamp,
                }
            }
        }
    }

    /// Returns the `since` value as sent to the exchange, empty for a fresh series.
    #[must_use]
    pub fn since_param(&self) -> String {
        self.since.map(|s| s.to_string()).unwrap_or_default()
    }
}

/// Computes resumption cursors from persisted state.
///
/// Nothing is cached between calls; the database is the only cursor store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResumptionTracker;

impl ResumptionTracker {
    /// Returns the cursor for the next fetch of `(symbol, period)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the latest-timestamp query fails.
    pub async fn next_since(
        session: &mut StoreSession,
        symbol: &Symbol,
        period: Period,
    ) -> Result<Cursor, StoreError> {
        let latest = session.latest_timestamp(symbol, period).await?;
        Ok(Cursor::resume(latest, period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_series() {
        let cursor = Cursor::resume(None, Period::Minute1);
        assert_eq!(cursor.since, None);
        assert_eq!(cursor.last_timestamp, 0);
        assert_eq!(cursor.since_param(), "");
    }

    #[test]
    fn test_resume_after_latest() {
        let cursor = Cursor::resume(Some(3000), Period::Minute1);
        assert_eq!(cursor.since, Some(63_000));
        assert_eq!(cursor.last_timestamp, 3000);
        assert_eq!(cursor.since_param(), "63000");

        let cursor = Cursor::resume(Some(1_500_000_000_000), Period::Week1);
        assert_eq!(cursor.since_param(), "1500604800000");
    }

    #[test]
    fn test_resume_every_period() {
        for &period in Period::all() {
            let cursor = Cursor::resume(Some(0), period);
            assert_eq!(cursor.since, Some(period.duration_ms() as i64));
        }
    }
}
