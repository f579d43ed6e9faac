//! Error types for the kline store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to obtain a pooled connection.
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A query, insert or commit failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking task running a database operation panicked or was cancelled.
    #[error("Database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Failed to create the directory holding the database file.
    #[error("Failed to create database directory '{path}': {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The session lost its connection after an earlier task failure.
    #[error("Store session has no connection")]
    SessionClosed,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
