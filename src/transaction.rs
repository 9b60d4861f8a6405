//! Transaction handle and the begin/commit/rollback envelope around a unit of work.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::database::Database;
use crate::error::SqlRecordError;
use crate::executor::{ExecOutcome, translate_for};
use crate::record::Record;
use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
use crate::postgres::PgTx;
#[cfg(feature = "sqlite")]
use crate::sqlite::{Params as SqliteParams, SqliteTx};

enum TxBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteTx),
    #[cfg(feature = "postgres")]
    Postgres(PgTx),
}

/// An open transaction.
///
/// Run statements through the [`Executor`](crate::Executor) impl, then call
/// [`commit`](Self::commit) or [`rollback`](Self::rollback). Dropping an unfinished `Tx`
/// (including while a panic unwinds) rolls back.
pub struct Tx {
    backend: TxBackend,
    translate_placeholders: bool,
}

/// A statement prepared against a [`Tx`]: placeholder translation already applied.
#[derive(Debug, Clone)]
pub struct Prepared {
    sql: Arc<str>,
}

impl Prepared {
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl Tx {
    #[cfg(feature = "sqlite")]
    pub(crate) fn sqlite(tx: SqliteTx, translate_placeholders: bool) -> Self {
        Self {
            backend: TxBackend::Sqlite(tx),
            translate_placeholders,
        }
    }

    #[cfg(feature = "postgres")]
    pub(crate) fn postgres(tx: PgTx, translate_placeholders: bool) -> Self {
        Self {
            backend: TxBackend::Postgres(tx),
            translate_placeholders,
        }
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        match &self.backend {
            #[cfg(feature = "sqlite")]
            TxBackend::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            TxBackend::Postgres(_) => DatabaseType::Postgres,
        }
    }

    pub(crate) fn translate<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        translate_for(self.db_type(), sql, self.translate_placeholders)
    }

    /// Prepare `sql` on the transaction's connection for repeated execution.
    ///
    /// The statement is compiled by the driver now, so malformed SQL or a missing table fails
    /// here rather than on first use. Driver statement caches make the later
    /// [`execute_prepared`](Self::execute_prepared) calls reuse it.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::ExecutionError`] if the driver rejects the statement and
    /// [`SqlRecordError::InvalidState`] if the transaction has already finished.
    pub async fn prepare(&mut self, sql: &str) -> Result<Prepared, SqlRecordError> {
        let translated = self.translate(sql).into_owned();
        let result = match &mut self.backend {
            #[cfg(feature = "sqlite")]
            TxBackend::Sqlite(tx) => tx.prepare(translated.clone()).await,
            #[cfg(feature = "postgres")]
            TxBackend::Postgres(tx) => tx.prepare(&translated).await,
        };
        result.map_err(|e| e.with_sql(sql))?;
        debug!(sql = %translated, "prepared in transaction");
        Ok(Prepared {
            sql: Arc::from(translated),
        })
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if conversion or execution fails.
    pub async fn execute_prepared(
        &mut self,
        prepared: &Prepared,
        args: &[RowValues],
    ) -> Result<ExecOutcome, SqlRecordError> {
        self.run_write(&prepared.sql, args, None)
            .await
            .map_err(|e| e.with_sql(&prepared.sql))
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if conversion, execution or decoding fails.
    pub async fn query_prepared(
        &mut self,
        prepared: &Prepared,
        args: &[RowValues],
    ) -> Result<Vec<Record>, SqlRecordError> {
        self.run_query(&prepared.sql, args)
            .await
            .map_err(|e| e.with_sql(&prepared.sql))
    }

    /// `sql` is already in the backend's placeholder style.
    pub(crate) async fn run_write(
        &mut self,
        sql: &str,
        args: &[RowValues],
        id_column: Option<&str>,
    ) -> Result<ExecOutcome, SqlRecordError> {
        match &mut self.backend {
            #[cfg(feature = "sqlite")]
            TxBackend::Sqlite(tx) => {
                let params = SqliteParams::convert(args)?;
                tx.execute(sql.to_owned(), params, id_column.is_some()).await
            }
            #[cfg(feature = "postgres")]
            TxBackend::Postgres(tx) => match id_column {
                Some(id_column) => tx.insert(sql, args, id_column).await,
                None => tx.execute(sql, args).await,
            },
        }
    }

    pub(crate) async fn run_query(
        &mut self,
        sql: &str,
        args: &[RowValues],
    ) -> Result<Vec<Record>, SqlRecordError> {
        match &mut self.backend {
            #[cfg(feature = "sqlite")]
            TxBackend::Sqlite(tx) => {
                let params = SqliteParams::convert(args)?;
                tx.query(sql.to_owned(), params).await
            }
            #[cfg(feature = "postgres")]
            TxBackend::Postgres(tx) => tx.query(sql, args).await,
        }
    }

    pub(crate) async fn run_batch(&mut self, sql: &str) -> Result<(), SqlRecordError> {
        match &mut self.backend {
            #[cfg(feature = "sqlite")]
            TxBackend::Sqlite(tx) => tx.execute_batch(sql.to_owned()).await,
            #[cfg(feature = "postgres")]
            TxBackend::Postgres(tx) => tx.execute_batch(sql).await,
        }
    }

    /// # Errors
    /// Returns the driver error if `COMMIT` fails.
    pub async fn commit(self) -> Result<(), SqlRecordError> {
        match self.backend {
            #[cfg(feature = "sqlite")]
            TxBackend::Sqlite(tx) => tx.commit().await,
            #[cfg(feature = "postgres")]
            TxBackend::Postgres(tx) => tx.commit().await,
        }
    }

    /// # Errors
    /// Returns the driver error if `ROLLBACK` fails.
    pub async fn rollback(self) -> Result<(), SqlRecordError> {
        match self.backend {
            #[cfg(feature = "sqlite")]
            TxBackend::Sqlite(tx) => tx.rollback().await,
            #[cfg(feature = "postgres")]
            TxBackend::Postgres(tx) => tx.rollback().await,
        }
    }
}

/// Future returned by a unit of work; it borrows the transaction for `'t`.
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T, SqlRecordError>> + Send + 't>>;

/// Run `work` inside a transaction.
///
/// Commits when `work` succeeds. When it fails the transaction is rolled back and the work's
/// error returned; if the rollback fails too, both come back as
/// [`SqlRecordError::TransactionError`]. A commit failure is returned as-is.
///
/// The closure receives the transaction by reference and must return a boxed future, so any
/// data it uses has to be moved in:
///
/// ```rust,no_run
/// use sql_record::prelude::*;
///
/// # async fn demo(db: &Database) -> Result<(), SqlRecordError> {
/// let stmt = build_insert("items", &record! { "name" => "bolt", "qty" => 10 })?;
/// let outcome = run_in_transaction(db, move |tx| {
///     Box::pin(async move { tx.insert(&stmt, "id").await })
/// })
/// .await?;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Returns [`SqlRecordError`] from `BEGIN`, from the work, from `COMMIT`, or the composite
/// rollback failure.
pub async fn run_in_transaction<T, F>(db: &Database, work: F) -> Result<T, SqlRecordError>
where
    F: for<'t> FnOnce(&'t mut Tx) -> TxFuture<'t, T>,
{
    let mut tx = db.begin().await?;
    let result = work(&mut tx).await;
    finish(tx, result).await
}

/// [`run_in_transaction`] with a deadline: if `work` has not finished after `timeout` it is
/// cancelled, the transaction rolled back, and [`SqlRecordError::Timeout`] returned.
///
/// # Errors
/// As [`run_in_transaction`], plus [`SqlRecordError::Timeout`].
pub async fn run_in_transaction_with_timeout<T, F>(
    db: &Database,
    timeout: Duration,
    work: F,
) -> Result<T, SqlRecordError>
where
    F: for<'t> FnOnce(&'t mut Tx) -> TxFuture<'t, T>,
{
    let mut tx = db.begin().await?;
    let result = match tokio::time::timeout(timeout, work(&mut tx)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?timeout, "transaction timed out; rolling back");
            Err(SqlRecordError::Timeout(timeout))
        }
    };
    finish(tx, result).await
}

async fn finish<T>(tx: Tx, result: Result<T, SqlRecordError>) -> Result<T, SqlRecordError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            debug!("transaction committed");
            Ok(value)
        }
        Err(cause) => match tx.rollback().await {
            Ok(()) => {
                debug!(error = %cause, "transaction rolled back");
                Err(cause)
            }
            Err(rollback) => {
                warn!(error = %cause, rollback_error = %rollback, "rollback failed");
                Err(SqlRecordError::TransactionError {
                    cause: Box::new(cause),
                    rollback: Box::new(rollback),
                })
            }
        },
    }
}
