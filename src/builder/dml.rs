use crate::error::BuildError;
use crate::record::Record;
use crate::types::RowValues;

use super::{GlueOperator, Statement, bindable, placeholders, where_clause};

/// `INSERT INTO table (c1, c2, ..) VALUES (?, ?, ..)`, one column per payload field.
///
/// # Errors
/// Returns [`BuildError::InvalidPayload`] for an empty payload and
/// [`BuildError::UnbindableValue`] for a sort-order value.
pub fn build_insert(table: &str, payload: &Record) -> Result<Statement, BuildError> {
    if payload.is_empty() {
        return Err(BuildError::InvalidPayload(format!(
            "insert into {table} needs at least one column"
        )));
    }

    let mut columns = Vec::with_capacity(payload.len());
    let mut args = Vec::with_capacity(payload.len());
    for (field, value) in payload {
        columns.push(field);
        args.push(bindable(field, value)?);
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len())
    );
    Ok(Statement::raw(sql, args))
}

/// Multi-row insert. The column list comes from the first payload.
///
/// Every payload must name exactly the same fields as the first one; values are pulled in the
/// first payload's column order, so only the key set matters, not each payload's own order.
///
/// # Errors
/// Returns [`BuildError::InvalidPayload`] when there are no payloads or the first is empty, and
/// [`BuildError::MismatchedPayload`] when a later payload has a different key set.
pub fn build_bulk_insert(table: &str, payloads: &[Record]) -> Result<Statement, BuildError> {
    let Some(first) = payloads.first() else {
        return Err(BuildError::InvalidPayload(format!(
            "bulk insert into {table} needs at least one payload"
        )));
    };
    if first.is_empty() {
        return Err(BuildError::InvalidPayload(format!(
            "bulk insert into {table} needs at least one column"
        )));
    }

    let columns: Vec<&str> = first.keys().collect();
    let row_placeholders = format!("({})", placeholders(columns.len()));
    let mut rows = Vec::with_capacity(payloads.len());
    let mut args = Vec::with_capacity(payloads.len() * columns.len());

    for (index, payload) in payloads.iter().enumerate() {
        if !payload.same_keys(first) {
            return Err(BuildError::MismatchedPayload {
                index,
                expected: columns.join(", "),
                found: payload.keys().collect::<Vec<_>>().join(", "),
            });
        }
        for column in &columns {
            let value = payload.get(column).unwrap_or(&RowValues::Null);
            args.push(bindable(column, value)?);
        }
        rows.push(row_placeholders.as_str());
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES {}",
        columns.join(", "),
        rows.join(", ")
    );
    Ok(Statement::raw(sql, args))
}

/// `UPDATE table SET a = ?, .. WHERE <filter>`; payload arguments come before filter arguments.
///
/// An empty filter is not rejected here: the statement ends in a bare `WHERE`. Callers that
/// mean to touch every row should use [`build_update_unfiltered`].
///
/// # Errors
/// Returns [`BuildError::InvalidPayload`] for an empty payload.
pub fn build_update(
    table: &str,
    filter: &Record,
    payload: &Record,
    glue: GlueOperator,
) -> Result<Statement, BuildError> {
    let (set, mut args) = set_clause(table, payload, filter.len())?;
    let predicates = where_clause(filter, glue, &mut args)?;
    let sql = format!("UPDATE {table} SET {set} WHERE {predicates}");
    Ok(Statement::raw(sql.trim_end(), args))
}

/// `UPDATE table SET a = ?, ..` with no filter at all.
///
/// # Errors
/// Returns [`BuildError::InvalidPayload`] for an empty payload.
pub fn build_update_unfiltered(table: &str, payload: &Record) -> Result<Statement, BuildError> {
    let (set, args) = set_clause(table, payload, 0)?;
    Ok(Statement::raw(format!("UPDATE {table} SET {set}"), args))
}

/// `DELETE FROM table WHERE <filter>`. An empty filter leaves a bare `WHERE`.
///
/// # Errors
/// Returns [`BuildError::UnbindableValue`] for a sort-order value in the filter.
pub fn build_delete(
    table: &str,
    filter: &Record,
    glue: GlueOperator,
) -> Result<Statement, BuildError> {
    let mut args = Vec::with_capacity(filter.len());
    let predicates = where_clause(filter, glue, &mut args)?;
    let sql = format!("DELETE FROM {table} WHERE {predicates}");
    Ok(Statement::raw(sql.trim_end(), args))
}

/// `DELETE FROM table`.
#[must_use]
pub fn build_delete_unfiltered(table: &str) -> Statement {
    Statement::raw(format!("DELETE FROM {table}"), Vec::new())
}

fn set_clause(
    table: &str,
    payload: &Record,
    extra_args: usize,
) -> Result<(String, Vec<RowValues>), BuildError> {
    if payload.is_empty() {
        return Err(BuildError::InvalidPayload(format!(
            "update of {table} needs at least one column to set"
        )));
    }
    let mut assignments = Vec::with_capacity(payload.len());
    let mut args = Vec::with_capacity(payload.len() + extra_args);
    for (field, value) in payload {
        assignments.push(format!("{field} = ?"));
        args.push(bindable(field, value)?);
    }
    Ok((assignments.join(", "), args))
}
