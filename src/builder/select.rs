use crate::error::BuildError;
use crate::record::Record;

use super::{GlueOperator, Statement, order_by_clause, where_clause};

/// `SELECT * FROM table WHERE <filter> LIMIT 1`.
///
/// Like update and delete, an empty filter still emits `WHERE`.
///
/// # Errors
/// Returns [`BuildError::UnbindableValue`] for a sort-order value in the filter.
pub fn build_first(
    table: &str,
    filter: &Record,
    glue: GlueOperator,
) -> Result<Statement, BuildError> {
    build_select(table, filter, glue, 1)
}

/// `SELECT * FROM table WHERE <filter> LIMIT <limit>`.
///
/// # Errors
/// Returns [`BuildError::UnbindableValue`] for a sort-order value in the filter.
pub fn build_select(
    table: &str,
    filter: &Record,
    glue: GlueOperator,
    limit: usize,
) -> Result<Statement, BuildError> {
    let mut args = Vec::with_capacity(filter.len());
    let predicates = where_clause(filter, glue, &mut args)?;
    let sql = if predicates.is_empty() {
        format!("SELECT * FROM {table} WHERE LIMIT {limit}")
    } else {
        format!("SELECT * FROM {table} WHERE {predicates} LIMIT {limit}")
    };
    Ok(Statement::raw(sql, args))
}

/// `SELECT * FROM table [WHERE <filter>] [ORDER BY <order_by>]`.
///
/// Unlike the other builders, an empty filter drops the `WHERE` keyword entirely, so this is
/// the way to read a whole table. An empty `order_by` drops `ORDER BY`.
///
/// # Errors
/// Returns [`BuildError::InvalidOrderBy`] when an order-by value is not a sort order and
/// [`BuildError::UnbindableValue`] for a sort-order value in the filter.
pub fn build_find(
    table: &str,
    filter: &Record,
    order_by: &Record,
    glue: GlueOperator,
) -> Result<Statement, BuildError> {
    let mut args = Vec::with_capacity(filter.len());
    let mut sql = format!("SELECT * FROM {table}");

    if !filter.is_empty() {
        let predicates = where_clause(filter, glue, &mut args)?;
        sql.push_str(" WHERE ");
        sql.push_str(&predicates);
    }

    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by_clause(order_by)?);
    }

    Ok(Statement::raw(sql, args))
}
