//! Table definitions.

use rusqlite::Connection;

/// Symbol registry. Row order is the order symbols are polled in.
pub const SYMBOLS_TABLE: &str = "CREATE TABLE IF NOT EXISTS symbols (
    symbol TEXT PRIMARY KEY NOT NULL
)";

/// Kline history. There is no unique constraint on
/// `(symbol, period, timestamp)`; duplicates are filtered by the ingestion
/// worker against the latest stored timestamp only.
pub const KLINE_HISTORY_TABLE: &str = "CREATE TABLE IF NOT EXISTS kline_history (
    id INTEGER PRIMARY KEY NOT NULL,
    symbol TEXT NOT NULL,
    base_currency TEXT NOT NULL,
    quote_currency TEXT NOT NULL,
    period TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    open TEXT NOT NULL,
    high TEXT NOT NULL,
    low TEXT NOT NULL,
    close TEXT NOT NULL,
    vol TEXT NOT NULL
)";

/// Index serving the latest-timestamp lookup.
pub const KLINE_SERIES_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_kline_history_series
    ON kline_history (symbol, period, timestamp)";

/// Creates all tables and indexes if missing.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "{SYMBOLS_TABLE};\n{KLINE_HISTORY_TABLE};\n{KLINE_SERIES_INDEX};"
    ))
}
