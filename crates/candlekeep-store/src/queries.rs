//! Synchronous queries against a single connection.
//!
//! [`StoreSession`](crate::StoreSession) runs these on the blocking pool;
//! they are public so tools and tests can use a plain [`Connection`].

use crate::StoredCandleRecord;
use candlekeep_types::{Period, Symbol};
use rusqlite::{Connection, OptionalExtension, params};

/// Latest stored candle and row count of one `(symbol, period)` series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSummary {
    /// The trading pair.
    pub symbol: String,
    /// The period token as stored.
    pub period: String,
    /// Most recent candle timestamp in milliseconds.
    pub latest_timestamp: i64,
    /// Number of stored rows.
    pub rows: u64,
}

/// Returns the registered symbols in registration order.
///
/// Rows that are not `<base>_<quote>` are logged and skipped.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn symbols(conn: &Connection) -> rusqlite::Result<Vec<Symbol>> {
    let mut stmt = conn.prepare("SELECT symbol FROM symbols ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut symbols = Vec::new();
    for raw in rows {
        match Symbol::new(raw?) {
            Ok(symbol) => symbols.push(symbol),
            Err(e) => tracing::warn!(error = %e, "skipping malformed registry symbol"),
        }
    }
    Ok(symbols)
}

/// Registers symbols, ignoring ones already present. Returns the number added.
///
/// # Errors
///
/// Returns an error if an insert fails; nothing is added in that case.
pub fn add_symbols(conn: &mut Connection, symbols: &[Symbol]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut added = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO symbols (symbol) VALUES (?1)")?;
        for symbol in symbols {
            added += stmt.execute(params![symbol.as_str()])?;
        }
    }
    tx.commit()?;
    Ok(added)
}

/// Returns the most recent stored timestamp of a series.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn latest_timestamp(
    conn: &Connection,
    symbol: &str,
    period: Period,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT timestamp FROM kline_history
         WHERE symbol = ?1 AND period = ?2
         ORDER BY timestamp DESC LIMIT 1",
        params![symbol, period.as_str()],
        |row| row.get(0),
    )
    .optional()
}

/// Returns the total number of stored candles.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn total_count(conn: &Connection) -> rusqlite::Result<u64> {
    conn.query_row("SELECT COUNT(id) FROM kline_history", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|count| u64::try_from(count).unwrap_or_default())
}

/// Inserts `records` in one transaction, committed once after the last insert.
///
/// Returns the number of rows inserted. On error the transaction is rolled
/// back when dropped and nothing from this batch is stored.
///
/// # Errors
///
/// Returns an error if an insert or the commit fails.
pub fn insert_batch(conn: &mut Connection, records: &[StoredCandleRecord]) -> rusqlite::Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO kline_history (
                id, symbol, base_currency, quote_currency, period,
                timestamp, open, high, low, close, vol)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for record in records {
            inserted += stmt.execute(params![
                record.id,
                record.symbol,
                record.base_currency,
                record.quote_currency,
                record.period.as_str(),
                record.timestamp,
                record.open.to_string(),
                record.high.to_string(),
                record.low.to_string(),
                record.close.to_string(),
                record.volume.to_string(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Returns the latest timestamp and row count of every stored series.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn series_summaries(conn: &Connection) -> rusqlite::Result<Vec<SeriesSummary>> {
    let mut stmt = conn.prepare(
        "SELECT symbol, period, MAX(timestamp), COUNT(id) FROM kline_history
         GROUP BY symbol, period
         ORDER BY symbol, period",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SeriesSummary {
            symbol: row.get(0)?,
            period: row.get(1)?,
            latest_timestamp: row.get(2)?,
            rows: u64::try_from(row.get::<_, i64>(3)?).unwrap_or_default(),
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::migrate;
    use candlekeep_types::Candle;
    use rust_decimal_macros::dec;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn record(id: i64, symbol: &str, period: Period, timestamp: i64) -> StoredCandleRecord {
        let candle = Candle::new(timestamp, dec!(1.1), dec!(1.2), dec!(1.0), dec!(1.15), dec!(7));
        StoredCandleRecord::new(id, &Symbol::new(symbol).unwrap(), period, &candle)
    }

    #[test]
    fn test_symbols_in_registration_order() {
        let mut conn = conn();
        let registered = vec![
            Symbol::new("ltc_btc").unwrap(),
            Symbol::new("eth_btc").unwrap(),
            Symbol::new("bch_usdt").unwrap(),
        ];
        assert_eq!(add_symbols(&mut conn, &registered).unwrap(), 3);
        assert_eq!(add_symbols(&mut conn, &registered[..1]).unwrap(), 0);

        conn.execute("INSERT INTO symbols (symbol) VALUES ('broken')", [])
            .unwrap();

        assert_eq!(symbols(&conn).unwrap(), registered);
    }

    #[test]
    fn test_latest_timestamp_per_series() {
        let mut conn = conn();
        assert_eq!(latest_timestamp(&conn, "ltc_btc", Period::Minute1).unwrap(), None);

        insert_batch(
            &mut conn,
            &[
                record(1, "ltc_btc", Period::Minute1, 2000),
                record(2, "ltc_btc", Period::Minute1, 3000),
                record(3, "ltc_btc", Period::Minute1, 1000),
                record(4, "ltc_btc", Period::Minute5, 9000),
                record(5, "eth_btc", Period::Minute1, 7000),
            ],
        )
        .unwrap();

        assert_eq!(
            latest_timestamp(&conn, "ltc_btc", Period::Minute1).unwrap(),
            Some(3000)
        );
        assert_eq!(
            latest_timestamp(&conn, "ltc_btc", Period::Minute5).unwrap(),
            Some(9000)
        );
        assert_eq!(total_count(&conn).unwrap(), 5);
    }

    #[test]
    fn test_insert_batch_is_atomic() {
        let mut conn = conn();
        insert_batch(&mut conn, &[record(1, "ltc_btc", Period::Minute1, 1000)]).unwrap();

        // Second record reuses id 1 and fails the primary key
        let result = insert_batch(
            &mut conn,
            &[
                record(2, "ltc_btc", Period::Minute1, 2000),
                record(1, "ltc_btc", Period::Minute1, 3000),
            ],
        );

        assert!(result.is_err());
        assert_eq!(total_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_insert_batch_preserves_decimals() {
        let mut conn = conn();
        insert_batch(&mut conn, &[record(1, "ltc_btc", Period::Day1, 86_400_000)]).unwrap();

        let (open, vol, base): (String, String, String) = conn
            .query_row(
                "SELECT open, vol, base_currency FROM kline_history WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(open, "1.1");
        assert_eq!(vol, "7");
        assert_eq!(base, "ltc");
    }

    #[test]
    fn test_series_summaries() {
        let mut conn = conn();
        insert_batch(
            &mut conn,
            &[
                record(1, "ltc_btc", Period::Minute1, 1000),
                record(2, "ltc_btc", Period::Minute1, 2000),
                record(3, "eth_btc", Period::Hour1, 3_600_000),
            ],
        )
        .unwrap();

        let summaries = series_summaries(&conn).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].symbol, "eth_btc");
        assert_eq!(summaries[0].period, "1hour");
        assert_eq!(summaries[1].latest_timestamp, 2000);
        assert_eq!(summaries[1].rows, 2);
    }
}
