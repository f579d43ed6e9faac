//! Shared utilities for candlekeep collectors.
//!
//! - [`logging`] - tracing subscriber setup with a rolling log file
//! - [`exlog`] - exception reports written to per-invocation files
//! - [`time`] - local-time formatting of epoch timestamps
//! - [`daemon`] - detaching the current binary into the background
//! - [`gzip`] - gzip decompression

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod daemon;
pub mod exlog;
pub mod gzip;
pub mod logging;
pub mod time;

pub use daemon::{DAEMON_ENV, DAEMON_RUN_ARG, DaemonError, Daemonizer};
pub use exlog::{DEFAULT_EXCEPTION_DIR, log_to_file, program_name, write_exception_log};
pub use gzip::{DecompressError, gzip_uncompress, is_gzip};
pub use logging::{LogConfig, LogFormat, LogGuard, LoggingError, init_logging};
