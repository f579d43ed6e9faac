//! Core types for the candlekeep kline collector.
//!
//! This crate provides the fundamental data structures used throughout candlekeep:
//!
//! - [`Period`] - The closed catalog of kline aggregation periods
//! - [`Symbol`] - An exchange trading pair such as `ltc_btc`
//! - [`Candle`] - A single OHLCV data point as returned by the exchange

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod candle;
mod error;
mod period;
mod symbol;

pub use candle::Candle;
pub use error::{InvalidPeriod, InvalidSymbol};
pub use period::{Period, parse_period_duration_ms, period_duration_ms};
pub use symbol::Symbol;
