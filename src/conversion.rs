//! Value conversion out of [`RowValues`] into plain Rust types.
//!
//! Drivers disagree on how they hand back some types (SQLite has no boolean or timestamp
//! storage class, text may come back as bytes), so conversions here accept every
//! representation a backend is known to produce for the target type.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::types::RowValues;

/// Conversion from a scanned value into `Self`.
///
/// The error is a human-readable reason; [`Schema`](crate::Schema) deserialization attaches the
/// field name and surfaces it as [`SqlRecordError::SchemaMismatch`](crate::SqlRecordError).
pub trait FromRowValue: Sized {
    /// # Errors
    /// Returns a description of the mismatch when `value` has no sensible conversion.
    fn from_row_value(value: &RowValues) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &RowValues) -> String {
    format!("expected {expected}, found {}", value.kind())
}

impl FromRowValue for RowValues {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromRowValue for i64 {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        match value {
            RowValues::Int(i) => Ok(*i),
            RowValues::Bool(b) => Ok(i64::from(*b)),
            other => Err(mismatch("int", other)),
        }
    }
}

impl FromRowValue for i32 {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        let wide = i64::from_row_value(value)?;
        i32::try_from(wide).map_err(|_| format!("{wide} does not fit in a 32-bit integer"))
    }
}

impl FromRowValue for f64 {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        match value {
            RowValues::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(i) => Ok(*i as f64),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        value
            .as_bool()
            .copied()
            .ok_or_else(|| mismatch("bool", value))
    }
}

impl FromRowValue for String {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        match value {
            RowValues::Text(s) => Ok(s.clone()),
            RowValues::Blob(bytes) => String::from_utf8(bytes.clone())
                .map_err(|e| format!("blob is not valid UTF-8: {e}")),
            other => Err(mismatch("text", other)),
        }
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        match value {
            RowValues::Blob(bytes) => Ok(bytes.clone()),
            RowValues::Text(s) => Ok(s.clone().into_bytes()),
            other => Err(mismatch("blob", other)),
        }
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch("timestamp", value))
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        match value {
            RowValues::JSON(v) => Ok(v.clone()),
            RowValues::Text(s) => {
                serde_json::from_str(s).map_err(|e| format!("text is not valid JSON: {e}"))
            }
            other => Err(mismatch("json", other)),
        }
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: &RowValues) -> Result<Self, String> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_columns_accept_utf8_blobs() {
        let v = RowValues::Blob(b"hello".to_vec());
        assert_eq!(String::from_row_value(&v).unwrap(), "hello");
        let bad = RowValues::Blob(vec![0xff, 0xfe]);
        assert!(String::from_row_value(&bad).is_err());
    }

    #[test]
    fn integers_narrow_with_range_check() {
        assert_eq!(i32::from_row_value(&RowValues::Int(42)).unwrap(), 42);
        assert!(i32::from_row_value(&RowValues::Int(i64::MAX)).is_err());
    }

    #[test]
    fn null_only_fits_options() {
        assert_eq!(
            Option::<i64>::from_row_value(&RowValues::Null).unwrap(),
            None
        );
        let err = i64::from_row_value(&RowValues::Null).unwrap_err();
        assert!(err.contains("null"), "{err}");
    }

    #[test]
    fn sqlite_shapes_convert() {
        assert!(bool::from_row_value(&RowValues::Int(1)).unwrap());
        assert!((f64::from_row_value(&RowValues::Int(3)).unwrap() - 3.0).abs() < f64::EPSILON);
        let ts = NaiveDateTime::from_row_value(&RowValues::Text("2024-01-02 03:04:05".into()))
            .unwrap();
        assert_eq!(ts.to_string(), "2024-01-02 03:04:05");
        let json = JsonValue::from_row_value(&RowValues::Text("{\"a\":1}".into())).unwrap();
        assert_eq!(json["a"], 1);
    }
}
