//! Local-time formatting for epoch timestamps.
//!
//! Exchange payloads mix second, millisecond and microsecond precision; the
//! helpers are named after the precision they expect so log lines stay
//! readable regardless of the source.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use thiserror::Error;

/// Format used for every human-readable timestamp in the logs.
pub const LOCALE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %w-%Z";

/// Input format accepted by [`parse_local_timestamp`].
pub const INPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error returned when a local date string cannot be converted to a timestamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// The string does not match `%Y-%m-%d %H:%M:%S`.
    #[error("invalid date '{input}': {reason}")]
    Format {
        /// The rejected input.
        input: String,
        /// Why chrono rejected it.
        reason: String,
    },

    /// The local time does not exist, e.g. inside a DST gap.
    #[error("date '{0}' does not exist in the local timezone")]
    Nonexistent(String),
}

fn format_local(secs: i64, nanos: u32, fmt: &str, original: i64) -> String {
    DateTime::from_timestamp(secs, nanos).map_or_else(
        || format!("invalid timestamp {original}"),
        |utc| utc.with_timezone(&Local).format(fmt).to_string(),
    )
}

/// Formats a 10-digit timestamp (seconds) in local time.
#[must_use]
pub fn locale_date_str_secs(secs: i64) -> String {
    format_local(secs, 0, LOCALE_FORMAT, secs)
}

/// Formats a 13-digit timestamp (milliseconds) in local time.
#[must_use]
pub fn locale_date_str_ms(ms: i64) -> String {
    let nanos = (ms.rem_euclid(1_000) * 1_000_000) as u32;
    format_local(ms.div_euclid(1_000), nanos, LOCALE_FORMAT, ms)
}

/// Formats a 16-digit timestamp (microseconds) in local time.
#[must_use]
pub fn locale_date_str_us(us: i64) -> String {
    let nanos = (us.rem_euclid(1_000_000) * 1_000) as u32;
    format_local(us.div_euclid(1_000_000), nanos, LOCALE_FORMAT, us)
}

/// Formats a timestamp (seconds) in local time using `sep` between the
/// date, time and weekday parts. Used for file names.
#[must_use]
pub fn locale_date_str_with_sep(secs: i64, sep: &str) -> String {
    let fmt = format!("%Y-%m-%d{sep}%H:%M:%S{sep}%w-%Z");
    format_local(secs, 0, &fmt, secs)
}

/// Parses a local date such as `2018-1-1 00:00:00` into a timestamp in seconds.
///
/// Ambiguous local times (DST fold) resolve to the earlier instant.
///
/// # Errors
///
/// Returns an error if the string is malformed or names a time that does not
/// exist locally.
pub fn parse_local_timestamp(input: &str) -> Result<i64, TimeParseError> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), INPUT_FORMAT).map_err(|e| {
        TimeParseError::Format {
            input: input.to_string(),
            reason: e.to_string(),
        }
    })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| TimeParseError::Nonexistent(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precisions_agree() {
        let secs = 1_530_000_000;
        let expected = locale_date_str_secs(secs);
        assert_eq!(locale_date_str_ms(secs * 1_000 + 999), expected);
        assert_eq!(locale_date_str_us(secs * 1_000_000 + 5), expected);
    }

    #[test]
    fn test_parse_then_format() {
        let ts = parse_local_timestamp("2018-1-1 00:00:00").unwrap();
        assert!(locale_date_str_secs(ts).starts_with("2018-01-01 00:00:00 1-"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_local_timestamp("yesterday"),
            Err(TimeParseError::Format { .. })
        ));
    }

    #[test]
    fn test_separator_variant() {
        let ts = parse_local_timestamp("2018-07-19 05:45:00").unwrap();
        let formatted = locale_date_str_with_sep(ts, "_");
        assert!(formatted.starts_with("2018-07-19_05:45:00_4-"));
        assert!(!formatted.contains(' '));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(locale_date_str_secs(i64::MAX), format!("invalid timestamp {}", i64::MAX));
    }
}
