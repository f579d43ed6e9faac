//! Kline endpoint URL construction.

use crate::KlineRequest;

/// Default exchange host.
pub const DEFAULT_BASE_URL: &str = "https://www.okex.com";

/// Path of the public kline endpoint.
pub const KLINE_PATH: &str = "/api/v1/kline.do";

/// Builds the kline URL for a request.
///
/// URL format: `{base}/api/v1/kline.do?symbol={symbol}&type={period}&since={since}&size={size}`
///
/// An absent `since` is sent as an empty value, which makes the exchange
/// return its most recent window.
///
/// # Example
///
/// ```
/// use candlekeep_fetch::{KlineRequest, url::kline_url};
/// use candlekeep_types::Period;
///
/// let request = KlineRequest::new("eth_btc".parse().unwrap(), Period::Hour4)
///     .with_since(Some(1_530_000_000_000))
///     .with_size(500);
/// let url = kline_url("https://www.okex.com/", &request);
/// assert_eq!(
///     url,
///     "https://www.okex.com/api/v1/kline.do?symbol=eth_btc&type=4hour&since=1530000000000&size=500"
/// );
/// ```
#[must_use]
pub fn kline_url(base_url: &str, request: &KlineRequest) -> String {
    format!(
        "{}{}?symbol={}&type={}&since={}&size={}",
        base_url.trim_end_matches('/'),
        KLINE_PATH,
        request.symbol,
        request.period,
        request.since_param(),
        request.size
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlekeep_types::{Period, Symbol};

    fn request() -> KlineRequest {
        KlineRequest::new(Symbol::new("ltc_btc").unwrap(), Period::Minute15)
    }

    #[test]
    fn test_kline_url_without_since() {
        let url = kline_url(DEFAULT_BASE_URL, &request());
        assert_eq!(
            url,
            "https://www.okex.com/api/v1/kline.do?symbol=ltc_btc&type=15min&since=&size=2000"
        );
    }

    #[test]
    fn test_kline_url_with_since() {
        let url = kline_url("http://127.0.0.1:8080", &request().with_since(Some(3000)));
        assert_eq!(
            url,
            "http://127.0.0.1:8080/api/v1/kline.do?symbol=ltc_btc&type=15min&since=3000&size=2000"
        );
    }
}
