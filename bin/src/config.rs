//! `candlekeep.toml` configuration.

use anyhow::{Context, Result};
use candlekeep_fetch::{ClientConfig, DEFAULT_PAGE_SIZE, DEFAULT_USER_AGENT};
use candlekeep_ingest::{DEFAULT_POLL_INTERVAL, SchedulerConfig, WorkerConfig};
use candlekeep_store::{DEFAULT_CONNECTION_TIMEOUT, DEFAULT_POOL_SIZE, StoreConfig};
use candlekeep_types::{Period, Symbol};
use candlekeep_util::{LogConfig, program_name};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file inside the config directory.
pub(crate) const CONFIG_FILE: &str = "candlekeep.toml";

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Symbols registered on startup in addition to the stored registry.
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) exchange: ExchangeConfig,
    pub(crate) database: DatabaseConfig,
    pub(crate) scheduler: SchedulerSection,
    pub(crate) logging: LogConfig,
}

/// `[exchange]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ExchangeConfig {
    pub(crate) base_url: String,
    pub(crate) timeout_secs: u64,
    pub(crate) user_agent: String,
    pub(crate) page_size: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url,
            timeout_secs: client.timeout.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// `[database]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DatabaseConfig {
    /// Database file; defaults to `klines.db` in the data directory.
    pub(crate) path: Option<PathBuf>,
    pub(crate) pool_size: u32,
    pub(crate) connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT.as_secs(),
        }
    }
}

/// `[scheduler]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SchedulerSection {
    pub(crate) poll_interval_secs: u64,
    pub(crate) periods: Vec<Period>,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            periods: Period::all().to_vec(),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, the file in the platform
    /// config directory is used if present and defaults otherwise.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    pub(crate) fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.exchange.base_url.clone(),
            timeout: Duration::from_secs(self.exchange.timeout_secs),
            user_agent: self.exchange.user_agent.clone(),
        }
    }

    pub(crate) fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| data_dir().join("klines.db"))
    }

    pub(crate) fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.database_path())
            .with_pool_size(self.database.pool_size.max(1))
            .with_connection_timeout(Duration::from_secs(self.database.connection_timeout_secs))
    }

    pub(crate) fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            page_size: self.exchange.page_size,
            exception_dir: self.logging.exception_dir.clone(),
            program: program_name(),
        }
    }

    pub(crate) fn scheduler_config(&self, only: Option<Period>) -> SchedulerConfig {
        SchedulerConfig {
            periods: only.map_or_else(|| self.scheduler.periods.clone(), |period| vec![period]),
            poll_interval: Duration::from_secs(self.scheduler.poll_interval_secs),
        }
    }
}

/// Platform data directory, e.g. `~/.local/share/candlekeep/` on Linux.
///
/// Falls back to `~/.candlekeep/` when it cannot be determined.
pub(crate) fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "candlekeep")
        .map_or_else(home_fallback, |dirs| dirs.data_dir().to_path_buf())
}

/// Platform config file location, e.g. `~/.config/candlekeep/candlekeep.toml`.
pub(crate) fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "candlekeep").map_or_else(
        || home_fallback().join(CONFIG_FILE),
        |dirs| dirs.config_dir().join(CONFIG_FILE),
    )
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".candlekeep")
}
