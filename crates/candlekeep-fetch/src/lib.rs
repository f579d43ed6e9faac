//! Exchange kline REST client for the candlekeep collector.
//!
//! - [`url::kline_url`] - Constructs kline endpoint URLs
//! - [`KlineClient`] - HTTP client for the kline endpoint
//! - [`parse_klines`] - Response body parsing
//! - [`KlineSource`] - The seam the ingestion worker fetches through

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod parse;
mod source;
pub mod url;

pub use client::{ClientConfig, DEFAULT_USER_AGENT, KlineClient};
pub use error::FetchError;
pub use parse::parse_klines;
pub use source::{DEFAULT_PAGE_SIZE, KlineRequest, KlineSource};
