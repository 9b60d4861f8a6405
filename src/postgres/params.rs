use std::error::Error;

use chrono::{TimeZone, Utc};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::error::SqlRecordError;
use crate::types::RowValues;

/// Borrowed Postgres parameters for one statement.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    /// # Errors
    /// Returns [`SqlRecordError::ParameterError`] for a sort-order value, which has no
    /// Postgres encoding.
    pub fn convert(params: &'a [RowValues]) -> Result<Params<'a>, SqlRecordError> {
        let mut references = Vec::with_capacity(params.len());
        for (idx, p) in params.iter().enumerate() {
            if let RowValues::Order(order) = p {
                return Err(SqlRecordError::ParameterError(format!(
                    "parameter ${} is the sort order {}",
                    idx + 1,
                    order.as_sql()
                )));
            }
            references.push(p as &(dyn ToSql + Sync));
        }
        Ok(Params { references })
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

impl ToSql for RowValues {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            // Records carry 64-bit ints; narrow to whatever the column was declared as.
            RowValues::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ => (*i).to_sql(ty, out),
            },
            #[allow(clippy::cast_possible_truncation)]
            RowValues::Float(f) if *ty == Type::FLOAT4 => (*f as f32).to_sql(ty, out),
            RowValues::Float(f) => (*f).to_sql(ty, out),
            RowValues::Text(s) => s.to_sql(ty, out),
            RowValues::Bool(b) => (*b).to_sql(ty, out),
            RowValues::Timestamp(dt) if *ty == Type::TIMESTAMPTZ => {
                Utc.from_utc_datetime(dt).to_sql(ty, out)
            }
            RowValues::Timestamp(dt) => dt.to_sql(ty, out),
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::JSON(jsval) => jsval.to_sql(ty, out),
            RowValues::Blob(bytes) => bytes.to_sql(ty, out),
            RowValues::Order(order) => {
                Err(format!("sort order {} cannot be bound", order.as_sql()).into())
            }
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortOrder;

    #[test]
    fn narrows_ints_to_column_width() {
        let mut buf = bytes::BytesMut::new();
        RowValues::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &7_i32.to_be_bytes());

        let mut buf = bytes::BytesMut::new();
        assert!(
            RowValues::Int(i64::from(i16::MAX) + 1)
                .to_sql(&Type::INT2, &mut buf)
                .is_err()
        );
    }

    #[test]
    fn null_encodes_as_sql_null() {
        let mut buf = bytes::BytesMut::new();
        let is_null = RowValues::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
    }

    #[test]
    fn sort_orders_are_not_parameters() {
        let args = [RowValues::Int(1), RowValues::Order(SortOrder::Desc)];
        let err = Params::convert(&args).err().unwrap();
        assert!(err.to_string().contains("$2"));
    }
}
