use rusqlite::types::Value;

use crate::binder::RowBinder;
use crate::error::SqlRecordError;
use crate::record::Record;
use crate::types::RowValues;

/// Extract a [`RowValues`] from a `SQLite` row.
///
/// # Errors
/// Returns [`SqlRecordError::SqliteError`] if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<RowValues, SqlRecordError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a prepared statement and drain every row into records.
///
/// # Errors
/// Returns [`SqlRecordError`] if execution or extraction fails.
pub fn build_records(
    stmt: &mut rusqlite::Statement<'_>,
    params: &[Value],
) -> Result<Vec<Record>, SqlRecordError> {
    let binder = RowBinder::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    );

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(binder.scan_row(|idx| sqlite_extract_value(row, idx))?);
    }
    Ok(records)
}
