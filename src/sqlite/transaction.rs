use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use crate::error::SqlRecordError;
use crate::executor::ExecOutcome;
use crate::record::Record;

use super::connection::{
    SharedSqliteConnection, SqliteSession, execute_on, join_error, query_on, recover_abandoned_tx,
};
use super::params::Params;

/// Transaction handle that holds the `SQLite` connection lock until it finishes.
///
/// Dropping it without [`commit`](Self::commit) or [`rollback`](Self::rollback) rolls back.
pub struct SqliteTx {
    guard: Option<OwnedMutexGuard<SqliteSession>>,
    shared: SharedSqliteConnection,
    id: u64,
}

fn completed() -> SqlRecordError {
    SqlRecordError::InvalidState("SQLite transaction already completed".into())
}

fn end_transaction(session: &mut SqliteSession, sql: &str) -> Result<(), SqlRecordError> {
    session.conn.execute_batch(sql)?;
    session.tx_open = false;
    Ok(())
}

impl SqliteTx {
    pub(crate) async fn begin(shared: SharedSqliteConnection) -> Result<Self, SqlRecordError> {
        let guard = Arc::clone(&shared).lock_owned().await;
        let mut tx = Self {
            guard: Some(guard),
            shared,
            id: 0,
        };
        tx.id = tx
            .with_session(|session| {
                recover_abandoned_tx(session);
                session.conn.execute_batch("BEGIN")?;
                session.tx_open = true;
                session.tx_id = session.tx_id.wrapping_add(1);
                Ok(session.tx_id)
            })
            .await?;
        Ok(tx)
    }

    /// Move the guard onto the blocking pool for one call and take it back afterwards.
    ///
    /// If this future is cancelled the guard is dropped on the blocking thread with the
    /// transaction still open; the next user of the connection rolls it back.
    async fn with_session<F, R>(&mut self, func: F) -> Result<R, SqlRecordError>
    where
        F: FnOnce(&mut SqliteSession) -> Result<R, SqlRecordError> + Send + 'static,
        R: Send + 'static,
    {
        let mut guard = self.guard.take().ok_or_else(completed)?;
        let (guard, result) = tokio::task::spawn_blocking(move || {
            let result = func(&mut *guard);
            (guard, result)
        })
        .await
        .map_err(join_error)?;
        self.guard = Some(guard);
        result
    }

    /// Compile `sql` into the connection's statement cache.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or `SQLite` rejects the statement.
    pub async fn prepare(&mut self, sql: String) -> Result<(), SqlRecordError> {
        self.with_session(move |session| {
            session.conn.prepare_cached(&sql)?;
            Ok(())
        })
        .await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the statement fails.
    pub async fn execute(
        &mut self,
        sql: String,
        params: Params,
        want_id: bool,
    ) -> Result<ExecOutcome, SqlRecordError> {
        self.with_session(move |session| execute_on(&session.conn, &sql, &params, want_id))
            .await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the query fails.
    pub async fn query(&mut self, sql: String, params: Params) -> Result<Vec<Record>, SqlRecordError> {
        self.with_session(move |session| query_on(&session.conn, &sql, &params))
            .await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the batch fails.
    pub async fn execute_batch(&mut self, sql: String) -> Result<(), SqlRecordError> {
        self.with_session(move |session| {
            session.conn.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }

    /// # Errors
    /// Returns [`SqlRecordError::SqliteError`] if `COMMIT` fails; the transaction is then
    /// rolled back when the handle drops.
    pub async fn commit(mut self) -> Result<(), SqlRecordError> {
        self.with_session(|session| end_transaction(session, "COMMIT"))
            .await
    }

    /// # Errors
    /// Returns [`SqlRecordError::SqliteError`] if `ROLLBACK` fails, e.g. because the
    /// transaction was already ended by a statement run inside it.
    pub async fn rollback(mut self) -> Result<(), SqlRecordError> {
        if self.guard.is_none() {
            // A cancelled call lost the guard. The transaction may still be open, or another
            // caller may already have recovered it and begun its own.
            let guard = Arc::clone(&self.shared).lock_owned().await;
            self.guard = Some(guard);
        }
        let id = self.id;
        self.with_session(move |session| {
            if session.tx_open && session.tx_id == id {
                end_transaction(session, "ROLLBACK")
            } else {
                Ok(())
            }
        })
        .await
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        let Some(mut guard) = self.guard.take() else {
            return;
        };
        if !guard.tx_open {
            return;
        }
        let mut rollback = move || recover_abandoned_tx(&mut *guard);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(rollback);
            }
            Err(_) => rollback(),
        }
    }
}
