//! Pooled SQLite store.

use crate::{IdGenerator, Result, SeriesSummary, StoreError, StoredCandleRecord, queries, schema};
use candlekeep_types::{Period, Symbol};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Connection pool over the kline database.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Default maximum number of pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 16;

/// Default time to wait for a free connection.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECTION_PRAGMAS: &str = "PRAGMA busy_timeout = 5000;
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;";

/// Configuration for [`KlineStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// Time to wait for a free connection.
    pub connection_timeout: Duration,
}

impl StoreConfig {
    /// Creates a configuration with default pool settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }

    /// Sets the maximum number of pooled connections.
    #[must_use]
    pub const fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the connection wait timeout.
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Kline history and symbol registry backed by a pooled SQLite database.
///
/// Cloning is cheap and clones share the pool and the id generator.
#[derive(Clone)]
pub struct KlineStore {
    pool: DbPool,
    ids: Arc<IdGenerator>,
    path: PathBuf,
}

impl fmt::Debug for KlineStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KlineStore")
            .field("path", &self.path)
            .field("pool_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

impl KlineStore {
    /// Opens the database, creating the file, its directory and the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the pool cannot
    /// be built, or the schema cannot be applied.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let manager = SqliteConnectionManager::file(&config.path)
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(1))
            .connection_timeout(config.connection_timeout)
            .build(manager)?;

        schema::migrate(&*pool.get()?)?;
        tracing::debug!(path = %config.path.display(), pool_size = config.pool_size, "kline store opened");

        Ok(Self {
            pool,
            ids: Arc::new(IdGenerator::new()),
            path: config.path.clone(),
        })
    }

    /// Returns the database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Checks out a connection for one ingestion pass.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection becomes free within the configured timeout.
    pub async fn session(&self) -> Result<StoreSession> {
        let pool = self.pool.clone();
        let conn = tokio::task::spawn_blocking(move || pool.get()).await??;
        Ok(StoreSession {
            conn: Some(conn),
            ids: Arc::clone(&self.ids),
        })
    }
}

/// A single pooled connection owned by one task.
///
/// Every query runs on the blocking thread pool; the connection is moved
/// into the blocking task and handed back when it finishes. A panic in that
/// task loses the connection and later calls fail with
/// [`StoreError::SessionClosed`].
pub struct StoreSession {
    conn: Option<PooledConnection<SqliteConnectionManager>>,
    ids: Arc<IdGenerator>,
}

impl fmt::Debug for StoreSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSession")
            .field("open", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}

impl StoreSession {
    async fn with_conn<T, F>(&mut self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let mut conn = self.conn.take().ok_or(StoreError::SessionClosed)?;
        let (conn, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut *conn);
            (conn, result)
        })
        .await?;
        self.conn = Some(conn);
        Ok(result?)
    }

    /// Returns the next synthetic row id.
    pub fn next_id(&self) -> i64 {
        self.ids.next_id()
    }

    /// Returns the registered symbols in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn symbols(&mut self) -> Result<Vec<Symbol>> {
        self.with_conn(|conn| queries::symbols(conn)).await
    }

    /// Registers symbols, returning how many were new.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn add_symbols(&mut self, symbols: Vec<Symbol>) -> Result<usize> {
        self.with_conn(move |conn| queries::add_symbols(conn, &symbols))
            .await
    }

    /// Returns the latest stored timestamp of a series.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn latest_timestamp(&mut self, symbol: &Symbol, period: Period) -> Result<Option<i64>> {
        let symbol = symbol.as_str().to_string();
        self.with_conn(move |conn| queries::latest_timestamp(conn, &symbol, period))
            .await
    }

    /// Returns the total number of stored candles.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn total_count(&mut self) -> Result<u64> {
        self.with_conn(|conn| queries::total_count(conn)).await
    }

    /// Inserts a batch in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert or the commit fails; no row of the
    /// batch is stored in that case.
    pub async fn insert_batch(&mut self, records: Vec<StoredCandleRecord>) -> Result<usize> {
        self.with_conn(move |conn| queries::insert_batch(conn, &records))
            .await
    }

    /// Returns per-series summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn series_summaries(&mut self) -> Result<Vec<SeriesSummary>> {
        self.with_conn(|conn| queries::series_summaries(conn)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlekeep_types::Candle;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> KlineStore {
        KlineStore::open(&StoreConfig::new(dir.path().join("data").join("klines.db")).with_pool_size(4))
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_database() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        assert!(store.path().exists());
        let mut session = store.session().await.unwrap();
        assert_eq!(session.total_count().await.unwrap(), 0);
        assert!(session.symbols().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let symbol = Symbol::new("ltc_btc").unwrap();

        let mut session = store.session().await.unwrap();
        assert_eq!(session.add_symbols(vec![symbol.clone()]).await.unwrap(), 1);

        let records: Vec<_> = [60_000, 120_000]
            .into_iter()
            .map(|ts| {
                let candle = Candle::new(ts, dec!(1), dec!(1), dec!(1), dec!(1), dec!(0));
                StoredCandleRecord::new(session.next_id(), &symbol, Period::Minute1, &candle)
            })
            .collect();
        assert_eq!(session.insert_batch(records).await.unwrap(), 2);

        assert_eq!(
            session.latest_timestamp(&symbol, Period::Minute1).await.unwrap(),
            Some(120_000)
        );
        assert_eq!(session.latest_timestamp(&symbol, Period::Minute3).await.unwrap(), None);
        assert_eq!(session.symbols().await.unwrap(), vec![symbol]);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let symbol = Symbol::new("eth_btc").unwrap();
        {
            let store = open(&dir);
            let mut session = store.session().await.unwrap();
            let candle = Candle::new(3_600_000, dec!(2), dec!(2), dec!(2), dec!(2), dec!(5));
            let record = StoredCandleRecord::new(session.next_id(), &symbol, Period::Hour1, &candle);
            session.insert_batch(vec![record]).await.unwrap();
        }

        let store = open(&dir);
        let mut session = store.session().await.unwrap();
        assert_eq!(session.total_count().await.unwrap(), 1);
        let summaries = session.series_summaries().await.unwrap();
        assert_eq!(summaries[0].period, "1hour");
    }

    #[tokio::test]
    async fn test_concurrent_sessions() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        let handles: Vec<_> = Period::all()
            .iter()
            .copied()
            .take(4)
            .map(|period| {
                let store = store.clone();
                tokio::spawn(async move {
                    let symbol = Symbol::new("ltc_btc").unwrap();
                    let mut session = store.session().await.unwrap();
                    let candle = Candle::new(period.duration_ms() as i64, dec!(1), dec!(1), dec!(1), dec!(1), dec!(1));
                    let record = StoredCandleRecord::new(session.next_id(), &symbol, period, &candle);
                    session.insert_batch(vec![record]).await.unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        let mut session = store.session().await.unwrap();
        assert_eq!(session.total_count().await.unwrap(), 4);
    }
}
