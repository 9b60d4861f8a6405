//! Connection settings: a serde-friendly options struct, environment lookup and clap args.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::SqlRecordError;
use crate::types::DatabaseType;

/// Environment variable naming the driver (`sqlite` or `postgres`).
pub const DRIVER_ENV: &str = "SQL_RECORD_DRIVER";
/// Environment variable holding the data source: a `SQLite` path or a Postgres DSN.
pub const DSN_ENV: &str = "SQL_RECORD_DSN";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Everything [`Database::connect`](crate::Database::connect) needs.
///
/// ```rust
/// use sql_record::prelude::*;
///
/// # #[cfg(feature = "sqlite")]
/// # {
/// let opts: ConnectOptions =
///     serde_json::from_str(r#"{ "db_type": "sqlite", "data_source": "app.db" }"#).unwrap();
/// assert!(!opts.translate_placeholders());
/// assert_eq!(opts.busy_timeout_ms, 5000);
/// # }
/// # #[cfg(feature = "postgres")]
/// # {
/// let opts: ConnectOptions = serde_json::from_str(
///     r#"{ "db_type": "postgres", "data_source": "postgres://app@localhost/app" }"#,
/// )
/// .unwrap();
/// assert!(opts.translate_placeholders());
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub db_type: DatabaseType,
    /// `SQLite` file path or `:memory:`; Postgres connection string or URL.
    pub data_source: String,
    /// Rewrite `?` placeholders for the backend. `None` picks the backend default: on for
    /// Postgres (the statement builder emits `?`), off for `SQLite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<bool>,
    /// `SQLite` only.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Postgres only; `None` keeps the pool's default size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,
}

impl ConnectOptions {
    #[must_use]
    pub fn new(db_type: DatabaseType, data_source: impl Into<String>) -> Self {
        Self {
            db_type,
            data_source: data_source.into(),
            translate: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            pool_size: None,
        }
    }

    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(DatabaseType::Sqlite, path)
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn postgres(dsn: impl Into<String>) -> Self {
        Self::new(DatabaseType::Postgres, dsn)
    }

    #[must_use]
    pub fn with_translation(mut self, translate: bool) -> Self {
        self.translate = Some(translate);
        self
    }

    #[must_use]
    pub fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    /// The effective placeholder-translation setting.
    #[must_use]
    pub fn translate_placeholders(&self) -> bool {
        self.translate.unwrap_or(match self.db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => false,
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => true,
        })
    }

    /// Read [`DRIVER_ENV`] and [`DSN_ENV`] from the process environment.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::ConfigError`] if a variable is missing or the driver is unknown.
    pub fn from_env() -> Result<Self, SqlRecordError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::ConfigError`] if a variable is missing or the driver is unknown.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SqlRecordError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| SqlRecordError::ConfigError(format!("{key} is not set")))
        };
        let driver = require(DRIVER_ENV)?;
        let db_type = DatabaseType::from_str(driver.trim(), true).map_err(|_| {
            SqlRecordError::ConfigError(format!("{DRIVER_ENV}: unknown driver '{driver}'"))
        })?;
        Ok(Self::new(db_type, require(DSN_ENV)?))
    }
}

/// Command-line flags for choosing a database, for embedding in a clap parser with
/// `#[command(flatten)]`.
#[derive(Debug, Clone, Args)]
pub struct ConnectArgs {
    /// Database driver
    #[arg(long, value_enum)]
    pub driver: DatabaseType,

    /// SQLite path (or :memory:) or Postgres connection string
    #[arg(long)]
    pub dsn: String,

    /// Disable `?` placeholder translation
    #[arg(long)]
    pub no_translate: bool,

    /// SQLite busy timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout_ms: u64,

    /// Postgres pool size
    #[arg(long)]
    pub pool_size: Option<usize>,
}

impl From<ConnectArgs> for ConnectOptions {
    fn from(args: ConnectArgs) -> Self {
        let mut options = ConnectOptions::new(args.driver, args.dsn)
            .with_busy_timeout_ms(args.busy_timeout_ms);
        if args.no_translate {
            options = options.with_translation(false);
        }
        options.pool_size = args.pool_size;
        options
    }
}
