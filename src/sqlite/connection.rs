use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::SqlRecordError;
use crate::executor::ExecOutcome;
use crate::record::Record;

use super::params::Params;
use super::query::build_records;
use super::transaction::SqliteTx;

/// The connection plus the bookkeeping the transaction handle needs.
pub struct SqliteSession {
    pub(crate) conn: rusqlite::Connection,
    /// Set while a [`SqliteTx`] has an open `BEGIN` on this connection.
    pub(crate) tx_open: bool,
    /// Bumped on every `BEGIN`, so a handle can tell its own transaction from a later one.
    pub(crate) tx_id: u64,
}

pub type SharedSqliteConnection = Arc<Mutex<SqliteSession>>;

/// Shared handle to the single `SQLite` connection a [`Database`](crate::Database) owns.
///
/// Every operation locks the connection and runs on the blocking pool, so at most one
/// statement is in flight at a time and an open transaction excludes everything else.
///
/// Closing any clone closes them all: later calls through the others fail with
/// [`SqlRecordError::ConnectionError`].
#[derive(Clone)]
pub struct SqliteHandle {
    shared: SharedSqliteConnection,
    data_source: Arc<str>,
    closed: Arc<AtomicBool>,
}

impl fmt::Debug for SqliteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteHandle")
            .field("data_source", &self.data_source)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl SqliteHandle {
    /// Open `data_source` (a file path or `:memory:`).
    ///
    /// File databases are switched to WAL journaling.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::SqliteError`] if the file cannot be opened or configured.
    pub async fn open(data_source: &str, busy_timeout: Duration) -> Result<Self, SqlRecordError> {
        let path = data_source.to_owned();
        let in_memory = path == ":memory:";
        let conn = tokio::task::spawn_blocking(move || -> Result<_, SqlRecordError> {
            let conn = if in_memory {
                rusqlite::Connection::open_in_memory()?
            } else {
                rusqlite::Connection::open(&path)?
            };
            conn.busy_timeout(busy_timeout)?;
            if !in_memory {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            Ok(conn)
        })
        .await
        .map_err(join_error)??;

        info!(data_source, "opened sqlite database");
        Ok(Self {
            shared: Arc::new(Mutex::new(SqliteSession {
                conn,
                tx_open: false,
                tx_id: 0,
            })),
            data_source: Arc::from(data_source),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    #[must_use]
    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The connection, or an error once any clone has been closed.
    fn live(&self) -> Result<SharedSqliteConnection, SqlRecordError> {
        if self.is_closed() {
            return Err(SqlRecordError::ConnectionError(format!(
                "sqlite database '{}' is closed",
                self.data_source
            )));
        }
        Ok(Arc::clone(&self.shared))
    }

    /// Mark every clone closed and close the connection if this is the last one.
    ///
    /// Returns `false` when other clones still hold the connection; it is then released
    /// when the last of them drops. Transactions already started run to completion.
    pub(crate) fn close(self) -> Result<bool, SqlRecordError> {
        self.closed.store(true, Ordering::Release);
        match Arc::try_unwrap(self.shared) {
            Ok(mutex) => {
                let session = mutex.into_inner();
                session.conn.close().map_err(|(_, err)| SqlRecordError::from(err))?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Run a DML statement; `want_id` also reports `last_insert_rowid`.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::SqliteError`] if preparing or executing fails.
    pub async fn execute(
        &self,
        sql: String,
        params: Params,
        want_id: bool,
    ) -> Result<ExecOutcome, SqlRecordError> {
        run_blocking(self.live()?, move |conn| {
            execute_on(conn, &sql, &params, want_id)
        })
        .await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if preparing, executing or extracting fails.
    pub async fn query(&self, sql: String, params: Params) -> Result<Vec<Record>, SqlRecordError> {
        run_blocking(self.live()?, move |conn| query_on(conn, &sql, &params)).await
    }

    /// # Errors
    /// Returns [`SqlRecordError::SqliteError`] if any statement in the batch fails.
    pub async fn execute_batch(&self, sql: String) -> Result<(), SqlRecordError> {
        run_blocking(self.live()?, move |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }

    /// Lock the connection and open a transaction on it.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::SqliteError`] if `BEGIN` fails.
    pub async fn begin(&self) -> Result<SqliteTx, SqlRecordError> {
        SqliteTx::begin(self.live()?).await
    }
}

pub(crate) fn execute_on(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &Params,
    want_id: bool,
) -> Result<ExecOutcome, SqlRecordError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.execute(rusqlite::params_from_iter(params.as_values().iter()))?;
    Ok(ExecOutcome {
        last_insert_id: want_id.then(|| conn.last_insert_rowid()),
        rows_affected: rows as u64,
    })
}

pub(crate) fn query_on(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &Params,
) -> Result<Vec<Record>, SqlRecordError> {
    let mut stmt = conn.prepare_cached(sql)?;
    build_records(&mut stmt, params.as_values())
}

/// Roll back a transaction whose [`SqliteTx`] went away without finishing.
///
/// That happens when a transactional future is cancelled while its statement was on the
/// blocking pool, or when the handle is dropped outside a runtime.
pub(crate) fn recover_abandoned_tx(session: &mut SqliteSession) {
    if !session.tx_open {
        return;
    }
    session.tx_open = false;
    if session.conn.is_autocommit() {
        return;
    }
    warn!("rolling back sqlite transaction left open by an abandoned handle");
    if let Err(err) = session.conn.execute_batch("ROLLBACK") {
        warn!(error = %err, "rollback of abandoned sqlite transaction failed");
    }
}

/// Lock the connection, then run `func` on the blocking pool.
pub(crate) async fn run_blocking<F, R>(
    shared: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlRecordError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlRecordError> + Send + 'static,
    R: Send + 'static,
{
    let mut guard = shared.lock_owned().await;
    tokio::task::spawn_blocking(move || {
        let session = &mut *guard;
        recover_abandoned_tx(session);
        func(&mut session.conn)
    })
    .await
    .map_err(join_error)?
}

pub(crate) fn join_error(err: tokio::task::JoinError) -> SqlRecordError {
    SqlRecordError::Other(format!("sqlite spawn_blocking join error: {err}"))
}
