//! The connection-handle contract shared by [`Database`] and [`Tx`].

use std::borrow::Cow;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::builder::Statement;
use crate::database::{Database, Backend};
use crate::error::SqlRecordError;
use crate::record::Record;
use crate::transaction::Tx;
use crate::translation::{PlaceholderStyle, translate_placeholders};
use crate::types::DatabaseType;

#[cfg(feature = "sqlite")]
use crate::sqlite::Params as SqliteParams;

/// What a write statement reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExecOutcome {
    /// Id of the last inserted row. Only set by [`Executor::insert`].
    pub last_insert_id: Option<i64>,
    pub rows_affected: u64,
}

/// Anything that can run a [`Statement`]: the database itself, or an open transaction.
///
/// Model operations have `*_with` variants taking `&mut impl Executor`, so the same code runs
/// inside or outside a transaction.
#[async_trait]
pub trait Executor: Send {
    /// Run a statement that returns no rows.
    async fn execute(&mut self, stmt: &Statement) -> Result<ExecOutcome, SqlRecordError>;

    /// Run an `INSERT` and report the id of the last row it created.
    ///
    /// `id_column` names the generated key; backends without a last-insert-id API read it back
    /// with `RETURNING`.
    async fn insert(
        &mut self,
        stmt: &Statement,
        id_column: &str,
    ) -> Result<ExecOutcome, SqlRecordError>;

    /// Run a statement and collect every row.
    async fn query(&mut self, stmt: &Statement) -> Result<Vec<Record>, SqlRecordError>;

    /// Run one or more `;`-separated statements without arguments.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlRecordError>;
}

/// Rewrite `sql` into the placeholder style of `db_type`.
pub(crate) fn translate_for(db_type: DatabaseType, sql: &str, enabled: bool) -> Cow<'_, str> {
    let style = match db_type {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => PlaceholderStyle::Sqlite,
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => PlaceholderStyle::Postgres,
    };
    translate_placeholders(sql, style, enabled)
}

impl Database {
    async fn run_write(
        &self,
        stmt: &Statement,
        id_column: Option<&str>,
    ) -> Result<ExecOutcome, SqlRecordError> {
        let sql = translate_for(self.db_type(), stmt.sql(), self.translate_placeholders());
        debug!(sql = %sql, args = stmt.args().len(), "execute");
        match self.backend() {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(handle) => {
                let params = SqliteParams::convert(stmt.args())?;
                handle
                    .execute(sql.into_owned(), params, id_column.is_some())
                    .await
            }
            #[cfg(feature = "postgres")]
            Backend::Postgres(handle) => match id_column {
                Some(id_column) => handle.insert(&sql, stmt.args(), id_column).await,
                None => handle.execute(&sql, stmt.args()).await,
            },
        }
    }
}

#[async_trait]
impl Executor for Database {
    async fn execute(&mut self, stmt: &Statement) -> Result<ExecOutcome, SqlRecordError> {
        self.run_write(stmt, None)
            .await
            .map_err(|e| e.with_sql(stmt.sql()))
    }

    async fn insert(
        &mut self,
        stmt: &Statement,
        id_column: &str,
    ) -> Result<ExecOutcome, SqlRecordError> {
        self.run_write(stmt, Some(id_column))
            .await
            .map_err(|e| e.with_sql(stmt.sql()))
    }

    async fn query(&mut self, stmt: &Statement) -> Result<Vec<Record>, SqlRecordError> {
        let sql = translate_for(self.db_type(), stmt.sql(), self.translate_placeholders());
        debug!(sql = %sql, args = stmt.args().len(), "query");
        let result = match self.backend() {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(handle) => match SqliteParams::convert(stmt.args()) {
                Ok(params) => handle.query(sql.into_owned(), params).await,
                Err(err) => Err(err),
            },
            #[cfg(feature = "postgres")]
            Backend::Postgres(handle) => handle.query(&sql, stmt.args()).await,
        };
        result.map_err(|e| e.with_sql(stmt.sql()))
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlRecordError> {
        debug!(sql, "execute batch");
        let result = match self.backend() {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite(handle) => handle.execute_batch(sql.to_owned()).await,
            #[cfg(feature = "postgres")]
            Backend::Postgres(handle) => handle.execute_batch(sql).await,
        };
        result.map_err(|e| e.with_sql(sql))
    }
}

#[async_trait]
impl Executor for Tx {
    async fn execute(&mut self, stmt: &Statement) -> Result<ExecOutcome, SqlRecordError> {
        let sql = self.translate(stmt.sql()).into_owned();
        debug!(sql = %sql, args = stmt.args().len(), "execute in transaction");
        self.run_write(&sql, stmt.args(), None)
            .await
            .map_err(|e| e.with_sql(stmt.sql()))
    }

    async fn insert(
        &mut self,
        stmt: &Statement,
        id_column: &str,
    ) -> Result<ExecOutcome, SqlRecordError> {
        let sql = self.translate(stmt.sql()).into_owned();
        debug!(sql = %sql, args = stmt.args().len(), "insert in transaction");
        self.run_write(&sql, stmt.args(), Some(id_column))
            .await
            .map_err(|e| e.with_sql(stmt.sql()))
    }

    async fn query(&mut self, stmt: &Statement) -> Result<Vec<Record>, SqlRecordError> {
        let sql = self.translate(stmt.sql()).into_owned();
        debug!(sql = %sql, args = stmt.args().len(), "query in transaction");
        self.run_query(&sql, stmt.args())
            .await
            .map_err(|e| e.with_sql(stmt.sql()))
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlRecordError> {
        debug!(sql, "execute batch in transaction");
        self.run_batch(sql).await.map_err(|e| e.with_sql(sql))
    }
}
