//! Kline aggregation period catalog.

use crate::InvalidPeriod;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unit suffixes accepted in period tokens, with their length in seconds.
const UNIT_SECONDS: [(&str, u64); 4] = [
    ("min", 60),
    ("hour", 3_600),
    ("day", 86_400),
    ("week", 604_800),
];

/// Kline aggregation period supported by the exchange.
///
/// The catalog is closed: every variant is polled by the scheduler on every run.
/// Ordering follows the catalog, shortest period first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    /// 1-minute klines.
    #[serde(rename = "1min")]
    Minute1,
    /// 3-minute klines.
    #[serde(rename = "3min")]
    Minute3,
    /// 5-minute klines.
    #[serde(rename = "5min")]
    Minute5,
    /// 15-minute klines.
    #[serde(rename = "15min")]
    Minute15,
    /// 30-minute klines.
    #[serde(rename = "30min")]
    Minute30,
    /// 1-hour klines.
    #[serde(rename = "1hour")]
    Hour1,
    /// 2-hour klines.
    #[serde(rename = "2hour")]
    Hour2,
    /// 4-hour klines.
    #[serde(rename = "4hour")]
    Hour4,
    /// 6-hour klines.
    #[serde(rename = "6hour")]
    Hour6,
    /// 12-hour klines.
    #[serde(rename = "12hour")]
    Hour12,
    /// Daily klines.
    #[serde(rename = "1day")]
    Day1,
    /// Weekly klines.
    #[serde(rename = "1week")]
    Week1,
}

impl Period {
    /// Returns the exchange token for this period, e.g. `"15min"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1min",
            Self::Minute3 => "3min",
            Self::Minute5 => "5min",
            Self::Minute15 => "15min",
            Self::Minute30 => "30min",
            Self::Hour1 => "1hour",
            Self::Hour2 => "2hour",
            Self::Hour4 => "4hour",
            Self::Hour6 => "6hour",
            Self::Hour12 => "12hour",
            Self::Day1 => "1day",
            Self::Week1 => "1week",
        }
    }

    /// Returns the duration in seconds.
    #[must_use]
    pub const fn seconds(&self) -> u64 {
        match self {
            Self::Minute1 => 60,
            Self::Minute3 => 180,
            Self::Minute5 => 300,
            Self::Minute15 => 900,
            Self::Minute30 => 1_800,
            Self::Hour1 => 3_600,
            Self::Hour2 => 7_200,
            Self::Hour4 => 14_400,
            Self::Hour6 => 21_600,
            Self::Hour12 => 43_200,
            Self::Day1 => 86_400,
            Self::Week1 => 604_800,
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.seconds() * 1000
    }

    /// Returns every period in the catalog.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute3,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Hour2,
            Self::Hour4,
            Self::Hour6,
            Self::Hour12,
            Self::Day1,
            Self::Week1,
        ]
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == token)
            .ok_or_else(|| InvalidPeriod(s.to_string()))
    }
}

/// Parses a `<positive integer><unit>` period token into its length in milliseconds.
///
/// Tokens outside the catalog are accepted as long as they are well formed,
/// so `"3day"` yields `259_200_000`.
///
/// # Errors
///
/// Returns [`InvalidPeriod`] if the unit is unknown, the count is not a
/// positive decimal integer, or the result overflows.
pub fn parse_period_duration_ms(token: &str) -> Result<u64, InvalidPeriod> {
    let invalid = || InvalidPeriod(token.to_string());

    let (count, unit_seconds) = UNIT_SECONDS
        .iter()
        .find_map(|(unit, secs)| token.strip_suffix(unit).map(|count| (count, *secs)))
        .ok_or_else(invalid)?;

    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let count: u64 = count.parse().map_err(|_| invalid())?;
    if count == 0 {
        return Err(invalid());
    }

    count
        .checked_mul(unit_seconds * 1000)
        .ok_or_else(invalid)
}

/// Returns the length of a period token in milliseconds, or `0` if the token is invalid.
///
/// A zero duration means the resumption cursor does not advance past the last
/// stored candle. The catalog is closed, so callers holding a [`Period`] never
/// reach this path; it is kept for raw tokens read from storage or config.
#[must_use]
pub fn period_duration_ms(token: &str) -> u64 {
    parse_period_duration_ms(token).unwrap_or_else(|e| {
        tracing::warn!(token, error = %e, "unrecognized period, using zero duration");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_duration_ms() {
        assert_eq!(Period::Minute15.duration_ms(), 900_000);
        assert_eq!(Period::Hour1.duration_ms(), 3_600_000);
        assert_eq!(Period::Day1.duration_ms(), 86_400_000);
        assert_eq!(Period::Week1.duration_ms(), 604_800_000);
    }

    #[test]
    fn test_catalog_matches_token_arithmetic() {
        for period in Period::all() {
            assert!(period.duration_ms() > 0);
            assert_eq!(period_duration_ms(period.as_str()), period.duration_ms());
        }
    }

    #[test]
    fn test_token_durations() {
        assert_eq!(period_duration_ms("15min"), 900_000);
        assert_eq!(period_duration_ms("1hour"), 3_600_000);
        assert_eq!(period_duration_ms("1day"), 86_400_000);
        assert_eq!(period_duration_ms("1week"), 604_800_000);
        assert_eq!(period_duration_ms("3day"), 259_200_000);
    }

    #[test]
    fn test_invalid_token_yields_zero() {
        assert_eq!(period_duration_ms("1month"), 0);
        assert_eq!(period_duration_ms("min"), 0);
        assert_eq!(period_duration_ms("0min"), 0);
        assert_eq!(period_duration_ms("+5min"), 0);
        assert_eq!(period_duration_ms(""), 0);
        assert!(parse_period_duration_ms("abchour").is_err());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("1min".parse::<Period>().unwrap(), Period::Minute1);
        assert_eq!("12HOUR".parse::<Period>().unwrap(), Period::Hour12);
        assert_eq!(
            "3day".parse::<Period>(),
            Err(InvalidPeriod("3day".to_string()))
        );
    }

    #[test]
    fn test_period_serde_uses_token() {
        let json = serde_json::to_string(&Period::Hour4).unwrap();
        assert_eq!(json, "\"4hour\"");
        let period: Period = serde_json::from_str("\"1week\"").unwrap();
        assert_eq!(period, Period::Week1);
    }

    #[test]
    fn test_catalog_order() {
        let all = Period::all();
        assert_eq!(all.len(), 12);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        assert!(all.windows(2).all(|w| w[0].duration_ms() < w[1].duration_ms()));
    }
}
