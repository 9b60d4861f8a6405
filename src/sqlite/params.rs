use rusqlite::types::Value;

use crate::error::SqlRecordError;
use crate::types::RowValues;

/// Convert a single [`RowValues`] into an owned `rusqlite` value.
///
/// `SQLite` has no boolean, timestamp or JSON storage class: booleans become integers,
/// timestamps become `YYYY-MM-DD HH:MM:SS[.f]` text and JSON becomes its serialized text.
///
/// # Errors
/// Returns [`SqlRecordError::ParameterError`] for a sort-order value.
pub fn row_value_to_sqlite_value(value: &RowValues) -> Result<Value, SqlRecordError> {
    Ok(match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(json) => Value::Text(json.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
        RowValues::Order(order) => {
            return Err(SqlRecordError::ParameterError(format!(
                "sort order {} cannot be bound as a SQLite parameter",
                order.as_sql()
            )));
        }
    })
}

/// Owned `SQLite` parameters, ready to move onto a blocking thread.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// # Errors
    /// Returns [`SqlRecordError::ParameterError`] if any value cannot be bound.
    pub fn convert(params: &[RowValues]) -> Result<Self, SqlRecordError> {
        params
            .iter()
            .map(row_value_to_sqlite_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Params)
    }

    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}
