//! HTTP client for the kline endpoint.

use crate::url::{DEFAULT_BASE_URL, kline_url};
use crate::{FetchError, KlineRequest, KlineSource, parse_klines};
use async_trait::async_trait;
use candlekeep_types::Candle;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;

/// Browser-like user agent; the exchange rejects obvious library agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; rv:32.0) Gecko/20100101 Firefox/32.0";

/// Configuration for the kline client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Exchange base URL, without the endpoint path.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// HTTP client for the exchange's kline endpoint.
///
/// Requests are never retried here; a failed symbol is picked up again on
/// the next scheduler run.
#[derive(Debug, Clone)]
pub struct KlineClient {
    client: Client,
    config: ClientConfig,
}

impl KlineClient {
    /// Creates a new kline client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let client = Client::builder()
            .default_headers(headers)
            // Keep connections alive for reuse across symbols
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches one page of klines.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, a
    /// malformed body, or an exchange `error_code` response.
    pub async fn fetch(&self, request: &KlineRequest) -> Result<Vec<Candle>, FetchError> {
        let url = kline_url(&self.config.base_url, request);
        tracing::debug!(%url, "requesting klines");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        parse_klines(&body)
    }
}

#[async_trait]
impl KlineSource for KlineClient {
    async fn fetch_klines(&self, request: &KlineRequest) -> Result<Vec<Candle>, FetchError> {
        self.fetch(request).await
    }
}
