//! The connection handle: one `SQLite` connection or one Postgres pool.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::ConnectOptions;
use crate::error::SqlRecordError;
use crate::model::Model;
use crate::schema::{Schema, TypedModel};
use crate::transaction::Tx;
use crate::types::DatabaseType;

#[cfg(feature = "postgres")]
use crate::postgres::{PgHandle, build_pool};
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteHandle;

/// Backend-specific handle behind a [`Database`].
#[derive(Clone, Debug)]
pub enum Backend {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteHandle),
    #[cfg(feature = "postgres")]
    Postgres(PgHandle),
}

/// An open database. Cloning is cheap and every clone shares the same connection or pool.
///
/// ```rust,no_run
/// use sql_record::prelude::*;
///
/// # #[cfg(feature = "sqlite")]
/// # async fn demo() -> Result<(), SqlRecordError> {
/// let db = Database::connect(&ConnectOptions::sqlite("app.db")).await?;
/// let items = db.model("items");
/// let id = items.insert(&record! { "name" => "widget", "qty" => 3 }).await?;
/// let row = items.first(&record! { "id" => id }, GlueOperator::And).await?;
/// # let _ = row;
/// db.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Database {
    backend: Backend,
    db_type: DatabaseType,
    translate_placeholders: bool,
}

impl Database {
    /// Open the database described by `options`.
    ///
    /// Postgres connections are checked out once before this returns, so an unreachable
    /// server fails here rather than on first use.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the data source cannot be opened or reached.
    pub async fn connect(options: &ConnectOptions) -> Result<Self, SqlRecordError> {
        let backend = match options.db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Backend::Sqlite(
                SqliteHandle::open(
                    &options.data_source,
                    Duration::from_millis(options.busy_timeout_ms),
                )
                .await?,
            ),
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => {
                let handle = PgHandle::new(build_pool(&options.data_source, options.pool_size)?);
                handle.ping().await?;
                Backend::Postgres(handle)
            }
        };
        let translate_placeholders = options.translate_placeholders();
        info!(
            db_type = ?options.db_type,
            translate_placeholders,
            "database connected"
        );
        Ok(Self {
            backend,
            db_type: options.db_type,
            translate_placeholders,
        })
    }

    /// Shorthand for a `SQLite` file (or `:memory:`) with default options.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the file cannot be opened.
    #[cfg(feature = "sqlite")]
    pub async fn open_sqlite(path: &str) -> Result<Self, SqlRecordError> {
        Self::connect(&ConnectOptions::sqlite(path)).await
    }

    /// Shorthand for a Postgres connection string with default options.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the DSN is invalid or the server is unreachable.
    #[cfg(feature = "postgres")]
    pub async fn open_postgres(dsn: &str) -> Result<Self, SqlRecordError> {
        Self::connect(&ConnectOptions::postgres(dsn)).await
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    #[must_use]
    pub fn translate_placeholders(&self) -> bool {
        self.translate_placeholders
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// A [`Model`] over `table` with primary key `id`.
    #[must_use]
    pub fn model(&self, table: impl Into<String>) -> Model {
        Model::new(self.clone(), table)
    }

    /// A [`TypedModel`] over `table` that deserializes rows into `S`.
    #[must_use]
    pub fn typed_model<S: Schema>(&self, table: impl Into<String>) -> TypedModel<S> {
        TypedModel::new(self.model(table))
    }

    /// Open a transaction.
    ///
    /// For `SQLite` the returned handle holds the connection until it commits, rolls back or
    /// drops; every other operation on this database waits for it.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if `BEGIN` fails or no pooled client is available.
    pub async fn begin(&self) -> Result<Tx, SqlRecordError> {
        let tx = match &self.backend {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(handle) => Tx::sqlite(handle.begin().await?, self.translate_placeholders),
            #[cfg(feature = "postgres")]
            Backend::Postgres(handle) => Tx::postgres(handle.begin().await?, self.translate_placeholders),
        };
        debug!(db_type = ?self.db_type, "transaction started");
        Ok(tx)
    }

    /// Close the connection or pool.
    ///
    /// Both backends close for every clone: later calls through a clone (or a model built
    /// from one) fail with [`SqlRecordError::ConnectionError`] for `SQLite` and
    /// [`SqlRecordError::PoolError`] for Postgres. A `SQLite` connection still held by live
    /// clones is released when the last of them drops.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::SqliteError`] if `SQLite` reports an error while closing.
    pub async fn close(self) -> Result<(), SqlRecordError> {
        match self.backend {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(handle) => {
                let data_source = handle.data_source().to_owned();
                if handle.close()? {
                    info!(data_source, "sqlite database closed");
                } else {
                    info!(data_source, "sqlite database closed; connection released when the last clone drops");
                }
            }
            #[cfg(feature = "postgres")]
            Backend::Postgres(handle) => {
                handle.close();
                info!("postgres pool closed");
            }
        }
        Ok(())
    }
}
