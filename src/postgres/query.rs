use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tokio_postgres::types::Type;

use crate::binder::RowBinder;
use crate::error::SqlRecordError;
use crate::record::Record;
use crate::types::RowValues;

/// Extracts a [`RowValues`] from a `tokio_postgres` row at the given index.
///
/// Types without a dedicated mapping are read as text, which covers enums, `uuid` and other
/// types whose binary form is their text form; anything else is a driver error.
///
/// # Errors
/// Returns [`SqlRecordError::PostgresError`] if the column cannot be decoded.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<RowValues, SqlRecordError> {
    let ty = row.columns()[idx].type_();
    let value = match *ty {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)?
            .map_or(RowValues::Null, RowValues::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)?
            .map_or(RowValues::Null, RowValues::Float),
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)?
            .map_or(RowValues::Null, RowValues::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map_or(RowValues::Null, RowValues::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map_or(RowValues::Null, |v| RowValues::Timestamp(v.naive_utc())),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<Value>>(idx)?
            .map_or(RowValues::Null, RowValues::JSON),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)?
            .map_or(RowValues::Null, RowValues::Blob),
        _ => row
            .try_get::<_, Option<String>>(idx)?
            .map_or(RowValues::Null, RowValues::Text),
    };
    Ok(value)
}

/// Fold rows returned for `stmt` into records.
///
/// # Errors
/// Returns [`SqlRecordError`] if any column fails to decode.
pub fn build_records(
    stmt: &tokio_postgres::Statement,
    rows: &[tokio_postgres::Row],
) -> Result<Vec<Record>, SqlRecordError> {
    let binder = RowBinder::new(
        stmt.columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect(),
    );
    rows.iter()
        .map(|row| binder.scan_row(|idx| postgres_extract_value(row, idx)))
        .collect()
}
