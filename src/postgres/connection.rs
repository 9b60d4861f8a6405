use deadpool_postgres::{ClientWrapper, Pool};
use tracing::debug;

use crate::error::SqlRecordError;
use crate::executor::ExecOutcome;
use crate::record::Record;
use crate::types::RowValues;

use super::params::Params;
use super::query::{build_records, postgres_extract_value};
use super::transaction::PgTx;

/// Pool handle owned by a [`Database`](crate::Database). Each call checks out one client.
#[derive(Clone, Debug)]
pub struct PgHandle {
    pool: Pool,
}

impl PgHandle {
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Check out a client once so a bad DSN fails at connect time.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::PoolError`] if no connection can be made.
    pub async fn ping(&self) -> Result<(), SqlRecordError> {
        let client = self.pool.get().await?;
        client.batch_execute("SELECT 1").await?;
        debug!(status = ?self.pool.status(), "postgres pool ready");
        Ok(())
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if checkout, conversion or execution fails.
    pub async fn execute(&self, sql: &str, args: &[RowValues]) -> Result<ExecOutcome, SqlRecordError> {
        let client = self.pool.get().await?;
        execute_on(&client, sql, args).await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if checkout, conversion or execution fails.
    pub async fn insert(
        &self,
        sql: &str,
        args: &[RowValues],
        id_column: &str,
    ) -> Result<ExecOutcome, SqlRecordError> {
        let client = self.pool.get().await?;
        insert_on(&client, sql, args, id_column).await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if checkout, conversion, execution or decoding fails.
    pub async fn query(&self, sql: &str, args: &[RowValues]) -> Result<Vec<Record>, SqlRecordError> {
        let client = self.pool.get().await?;
        query_on(&client, sql, args).await
    }

    /// # Errors
    /// Returns [`SqlRecordError`] if checkout or any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlRecordError> {
        let client = self.pool.get().await?;
        client.batch_execute(sql).await?;
        Ok(())
    }

    /// Check out a client and open a transaction on it.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if checkout or `BEGIN` fails.
    pub async fn begin(&self) -> Result<PgTx, SqlRecordError> {
        let client = self.pool.get().await?;
        PgTx::begin(client).await
    }

    pub fn close(&self) {
        self.pool.close();
    }
}

pub(crate) async fn execute_on(
    client: &ClientWrapper,
    sql: &str,
    args: &[RowValues],
) -> Result<ExecOutcome, SqlRecordError> {
    let params = Params::convert(args)?;
    let stmt = client.prepare_cached(sql).await?;
    let rows_affected = client.execute(&stmt, params.as_refs()).await?;
    Ok(ExecOutcome {
        last_insert_id: None,
        rows_affected,
    })
}

/// Postgres has no last-insert-id; the id comes back through `RETURNING`.
pub(crate) async fn insert_on(
    client: &ClientWrapper,
    sql: &str,
    args: &[RowValues],
    id_column: &str,
) -> Result<ExecOutcome, SqlRecordError> {
    let params = Params::convert(args)?;
    let returning = format!("{sql} RETURNING {id_column}");
    let stmt = client.prepare_cached(&returning).await?;
    let rows = client.query(&stmt, params.as_refs()).await?;
    let last_insert_id = match rows.last() {
        Some(row) => postgres_extract_value(row, 0)?.as_int().copied(),
        None => None,
    };
    Ok(ExecOutcome {
        last_insert_id,
        rows_affected: rows.len() as u64,
    })
}

pub(crate) async fn query_on(
    client: &ClientWrapper,
    sql: &str,
    args: &[RowValues],
) -> Result<Vec<Record>, SqlRecordError> {
    let params = Params::convert(args)?;
    let stmt = client.prepare_cached(sql).await?;
    let rows = client.query(&stmt, params.as_refs()).await?;
    build_records(&stmt, &rows)
}
