//! Kline response parsing.

use crate::FetchError;
use candlekeep_types::Candle;
use candlekeep_util::{gzip_uncompress, is_gzip};
use serde_json::Value;

/// Parses a kline response body.
///
/// The exchange answers with either an array of
/// `[timestamp, open, high, low, close, volume]` arrays or an object carrying
/// an `error_code`. Gzip-compressed bodies are decompressed first.
///
/// Candles keep the exchange's order; no sorting or validation is applied.
///
/// # Errors
///
/// Returns [`FetchError::Exchange`] for an `error_code` object, and
/// [`FetchError::Decode`] or [`FetchError::Decompress`] for malformed bodies.
pub fn parse_klines(body: &[u8]) -> Result<Vec<Candle>, FetchError> {
    let decompressed;
    let body = if is_gzip(body) {
        decompressed = gzip_uncompress(body)?;
        decompressed.as_slice()
    } else {
        body
    };

    let value: Value = serde_json::from_slice(body)?;

    if let Some(code) = value.get("error_code") {
        let code = match code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(FetchError::Exchange { code });
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_parse_candles_in_exchange_order() {
        let body = br#"[
            [3000, 0.0171, 0.0172, 0.0170, 0.0171, 10.5],
            [1000, 0.0168, 0.0170, 0.0167, 0.0169, 3.25]
        ]"#;

        let candles = parse_klines(body).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 3000);
        assert_eq!(candles[0].high, dec!(0.0172));
        assert_eq!(candles[1].timestamp, 1000);
        assert_eq!(candles[1].volume, dec!(3.25));
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_klines(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_exchange_error() {
        let err = parse_klines(br#"{"error_code":1007,"result":false}"#).unwrap_err();
        assert!(err.is_exchange_error());
        assert!(matches!(err, FetchError::Exchange { ref code } if code == "1007"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_klines(b"<html>"), Err(FetchError::Decode(_))));
        assert!(matches!(
            parse_klines(br#"{"result":true}"#),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            parse_klines(br#"[[1000, 1, 2]]"#),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_gzip_body() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"[[1000, "1", "2", "0.5", "1.5", "100"]]"#).unwrap();
        let compressed = encoder.finish().unwrap();

        let candles = parse_klines(&compressed).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].low, dec!(0.5));
    }
}
