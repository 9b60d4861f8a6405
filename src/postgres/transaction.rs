use deadpool_postgres::{ClientWrapper, Object};
use tracing::warn;

use crate::error::SqlRecordError;
use crate::executor::ExecOutcome;
use crate::record::Record;
use crate::types::RowValues;

use super::connection::{execute_on, insert_on, query_on};

/// Transaction handle owning one pooled Postgres client.
///
/// `BEGIN`/`COMMIT`/`ROLLBACK` are issued as plain statements so the handle can own the client
/// instead of borrowing it. Dropping an unfinished handle rolls back; a client whose
/// transaction state is unknown is detached from the pool rather than returned to it.
pub struct PgTx {
    client: Option<Object>,
}

impl PgTx {
    pub(crate) async fn begin(client: Object) -> Result<Self, SqlRecordError> {
        client.batch_execute("BEGIN").await?;
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&ClientWrapper, SqlRecordError> {
        self.client
            .as_deref()
            .ok_or_else(|| SqlRecordError::InvalidState("Postgres transaction already completed".into()))
    }

    /// Prepare `sql` on the transaction's client, caching the statement for later calls.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the server rejects the statement.
    pub async fn prepare(&mut self, sql: &str) -> Result<(), SqlRecordError> {
        self.client()?.prepare_cached(sql).await?;
        Ok(())
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the statement fails.
    pub async fn execute(&mut self, sql: &str, args: &[RowValues]) -> Result<ExecOutcome, SqlRecordError> {
        execute_on(self.client()?, sql, args).await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the statement fails.
    pub async fn insert(
        &mut self,
        sql: &str,
        args: &[RowValues],
        id_column: &str,
    ) -> Result<ExecOutcome, SqlRecordError> {
        insert_on(self.client()?, sql, args, id_column).await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the query fails.
    pub async fn query(&mut self, sql: &str, args: &[RowValues]) -> Result<Vec<Record>, SqlRecordError> {
        query_on(self.client()?, sql, args).await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if the handle is finished or the batch fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlRecordError> {
        self.client()?.batch_execute(sql).await?;
        Ok(())
    }

    async fn finish(mut self, sql: &str) -> Result<(), SqlRecordError> {
        let client = self.client.take().ok_or_else(|| {
            SqlRecordError::InvalidState("Postgres transaction already completed".into())
        })?;
        if let Err(err) = client.batch_execute(sql).await {
            drop(Object::take(client));
            return Err(err.into());
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`SqlRecordError::PostgresError`] if `COMMIT` fails.
    pub async fn commit(self) -> Result<(), SqlRecordError> {
        self.finish("COMMIT").await
    }

    /// # Errors
    /// Returns [`SqlRecordError::PostgresError`] if `ROLLBACK` fails.
    pub async fn rollback(self) -> Result<(), SqlRecordError> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PgTx {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = client.batch_execute("ROLLBACK").await {
                        warn!(error = %err, "rollback of dropped postgres transaction failed");
                        drop(Object::take(client));
                    }
                });
            }
            Err(_) => drop(Object::take(client)),
        }
    }
}
