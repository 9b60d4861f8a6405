//! Table-bound façade over the statement builder and an [`Executor`].

use crate::builder::{
    GlueOperator, Statement, build_bulk_insert, build_delete, build_delete_unfiltered,
    build_find, build_insert, build_select, build_update, build_update_unfiltered,
};
use crate::database::Database;
use crate::error::{BuildError, SqlRecordError};
use crate::executor::{ExecOutcome, Executor};
use crate::record::Record;
use crate::transaction::run_in_transaction;
use crate::types::SortOrder;

/// A table name and primary-key column bound to a [`Database`].
///
/// Every operation has a `*_with` twin that runs on a caller-supplied executor, typically an
/// open [`Tx`](crate::Tx):
///
/// ```rust,no_run
/// use sql_record::prelude::*;
///
/// # async fn demo(db: &Database) -> Result<(), SqlRecordError> {
/// let items = db.model("items");
/// let mut tx = db.begin().await?;
/// let id = items.insert_with(&mut tx, &record! { "name" => "nut", "qty" => 1 }).await?;
/// items
///     .update_with(&mut tx, &record! { "id" => id }, &record! { "qty" => 2 }, GlueOperator::And)
///     .await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Model {
    table: String,
    primary_key: String,
    db: Database,
}

impl Model {
    #[must_use]
    pub fn new(db: Database, table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: "id".to_owned(),
            db,
        }
    }

    /// Use `column` instead of `id` as the generated key and default sort column.
    #[must_use]
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert one row and return its generated id.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the payload is invalid or the insert fails.
    pub async fn insert(&self, payload: &Record) -> Result<i64, SqlRecordError> {
        self.insert_with(&mut self.db.clone(), payload).await
    }

    /// # Errors
    /// See [`insert`](Self::insert).
    pub async fn insert_with<E>(&self, exec: &mut E, payload: &Record) -> Result<i64, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        let stmt = build_insert(&self.table, payload)?;
        let outcome = exec.insert(&stmt, &self.primary_key).await?;
        outcome.last_insert_id.ok_or_else(|| {
            SqlRecordError::InvalidState(format!(
                "insert into {} did not report an id",
                self.table
            ))
        })
    }

    /// Insert every payload in one statement, inside its own transaction.
    ///
    /// All payloads must name the same fields.
    ///
    /// # Errors
    /// Returns [`BuildError::MismatchedPayload`] (wrapped) when key sets differ, or the
    /// transaction's error.
    pub async fn insert_bulk(&self, payloads: &[Record]) -> Result<ExecOutcome, SqlRecordError> {
        let stmt = build_bulk_insert(&self.table, payloads)?;
        let id_column = self.primary_key.clone();
        run_in_transaction(&self.db, move |tx| {
            Box::pin(async move { tx.insert(&stmt, &id_column).await })
        })
        .await
    }

    /// Bulk insert on a caller-supplied executor, without opening a transaction of its own.
    ///
    /// # Errors
    /// See [`insert_bulk`](Self::insert_bulk).
    pub async fn insert_bulk_with<E>(
        &self,
        exec: &mut E,
        payloads: &[Record],
    ) -> Result<ExecOutcome, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        let stmt = build_bulk_insert(&self.table, payloads)?;
        exec.insert(&stmt, &self.primary_key).await
    }

    /// Set `payload` on every row matching `filter`; returns the number of rows changed.
    ///
    /// # Errors
    /// Returns [`BuildError::EmptyFilter`] (wrapped) for an empty filter; use
    /// [`update_all`](Self::update_all) to touch the whole table.
    pub async fn update(
        &self,
        filter: &Record,
        payload: &Record,
        glue: GlueOperator,
    ) -> Result<u64, SqlRecordError> {
        self.update_with(&mut self.db.clone(), filter, payload, glue)
            .await
    }

    /// # Errors
    /// See [`update`](Self::update).
    pub async fn update_with<E>(
        &self,
        exec: &mut E,
        filter: &Record,
        payload: &Record,
        glue: GlueOperator,
    ) -> Result<u64, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        require_filter(filter, "update")?;
        let stmt = build_update(&self.table, filter, payload, glue)?;
        Ok(exec.execute(&stmt).await?.rows_affected)
    }

    /// Set `payload` on every row of the table.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the payload is invalid or the update fails.
    pub async fn update_all(&self, payload: &Record) -> Result<u64, SqlRecordError> {
        let stmt = build_update_unfiltered(&self.table, payload)?;
        Ok(self.db.clone().execute(&stmt).await?.rows_affected)
    }

    /// Delete rows matching `filter`; returns the number of rows removed.
    ///
    /// # Errors
    /// Returns [`BuildError::EmptyFilter`] (wrapped) for an empty filter; use
    /// [`delete_all`](Self::delete_all) to empty the table.
    pub async fn delete(&self, filter: &Record, glue: GlueOperator) -> Result<u64, SqlRecordError> {
        self.delete_with(&mut self.db.clone(), filter, glue).await
    }

    /// # Errors
    /// See [`delete`](Self::delete).
    pub async fn delete_with<E>(
        &self,
        exec: &mut E,
        filter: &Record,
        glue: GlueOperator,
    ) -> Result<u64, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        require_filter(filter, "delete")?;
        let stmt = build_delete(&self.table, filter, glue)?;
        Ok(exec.execute(&stmt).await?.rows_affected)
    }

    /// Delete every row of the table.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the delete fails.
    pub async fn delete_all(&self) -> Result<u64, SqlRecordError> {
        let stmt = build_delete_unfiltered(&self.table);
        Ok(self.db.clone().execute(&stmt).await?.rows_affected)
    }

    /// The single row matching `filter`.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::EmptyResult`] when nothing matches,
    /// [`SqlRecordError::AmbiguousResult`] when more than one row does, and
    /// [`BuildError::EmptyFilter`] (wrapped) for an empty filter.
    pub async fn first(&self, filter: &Record, glue: GlueOperator) -> Result<Record, SqlRecordError> {
        self.first_with(&mut self.db.clone(), filter, glue).await
    }

    /// # Errors
    /// See [`first`](Self::first).
    pub async fn first_with<E>(
        &self,
        exec: &mut E,
        filter: &Record,
        glue: GlueOperator,
    ) -> Result<Record, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        require_filter(filter, "first")?;
        // Two rows are enough to tell "exactly one" from "more than one".
        let stmt = build_select(&self.table, filter, glue, 2)?;
        let mut rows = exec.query(&stmt).await?;
        match rows.len() {
            0 => Err(SqlRecordError::EmptyResult),
            1 => Ok(rows.swap_remove(0)),
            n => Err(SqlRecordError::AmbiguousResult(n)),
        }
    }

    /// Rows matching `filter`, sorted by `order_by` or, when `None`, by primary key descending.
    ///
    /// An empty filter selects every row.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the order-by record is invalid or the query fails.
    pub async fn find(
        &self,
        filter: &Record,
        order_by: Option<&Record>,
        glue: GlueOperator,
    ) -> Result<Vec<Record>, SqlRecordError> {
        self.find_with(&mut self.db.clone(), filter, order_by, glue)
            .await
    }

    /// # Errors
    /// See [`find`](Self::find).
    pub async fn find_with<E>(
        &self,
        exec: &mut E,
        filter: &Record,
        order_by: Option<&Record>,
        glue: GlueOperator,
    ) -> Result<Vec<Record>, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        let stmt = self.find_statement(filter, order_by, glue)?;
        exec.query(&stmt).await
    }

    /// Every row, primary key descending.
    ///
    /// # Errors
    /// Returns [`SqlRecordError`] if the query fails.
    pub async fn find_all(&self) -> Result<Vec<Record>, SqlRecordError> {
        self.find(&Record::new(), None, GlueOperator::And).await
    }

    pub(crate) fn find_statement(
        &self,
        filter: &Record,
        order_by: Option<&Record>,
        glue: GlueOperator,
    ) -> Result<Statement, BuildError> {
        match order_by {
            Some(order_by) => build_find(&self.table, filter, order_by, glue),
            None => build_find(
                &self.table,
                filter,
                &Record::order_by(self.primary_key.as_str(), SortOrder::Desc),
                glue,
            ),
        }
    }
}

fn require_filter(filter: &Record, operation: &'static str) -> Result<(), BuildError> {
    if filter.is_empty() {
        Err(BuildError::EmptyFilter(operation))
    } else {
        Ok(())
    }
}
