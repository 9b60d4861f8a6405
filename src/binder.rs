//! Row binder: turns a result set's columns and scanned values back into [`Record`]s.

use std::sync::Arc;

use crate::error::SqlRecordError;
use crate::record::Record;
use crate::types::RowValues;

/// One scan slot per result column, filled by a backend before [`RowBinder::bind`].
pub type ScanSlots = Vec<RowValues>;

/// Column layout of one result set.
///
/// Built once per query from the statement's column names, then reused for every row. The
/// binder knows nothing about the schema; each slot takes whatever variant the driver hands
/// back, blobs included.
#[derive(Debug, Clone)]
pub struct RowBinder {
    columns: Arc<Vec<String>>,
}

impl RowBinder {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: Arc::new(columns),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fresh slots, all `Null`, one per column.
    #[must_use]
    pub fn slots(&self) -> ScanSlots {
        vec![RowValues::Null; self.columns.len()]
    }

    /// Fold filled slots into a record keyed by column name.
    ///
    /// When a column name repeats, the later column wins.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::Binder`] if the slot count does not match the column count.
    pub fn bind(&self, slots: ScanSlots) -> Result<Record, SqlRecordError> {
        if slots.len() != self.columns.len() {
            return Err(SqlRecordError::Binder(format!(
                "{} values scanned for {} columns",
                slots.len(),
                self.columns.len()
            )));
        }
        let mut record = Record::with_capacity(slots.len());
        for (column, value) in self.columns.iter().zip(slots) {
            record.insert(column.as_str(), value);
        }
        Ok(record)
    }

    /// Scan one row: `fetch` is asked for each column index in order.
    ///
    /// # Errors
    /// Propagates the first error returned by `fetch`.
    pub fn scan_row<F>(&self, mut fetch: F) -> Result<Record, SqlRecordError>
    where
        F: FnMut(usize) -> Result<RowValues, SqlRecordError>,
    {
        let mut slots = self.slots();
        for (idx, slot) in slots.iter_mut().enumerate() {
            *slot = fetch(idx)?;
        }
        self.bind(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_heterogeneous_columns() {
        let binder = RowBinder::new(vec!["id".into(), "name".into(), "payload".into()]);
        let record = binder
            .scan_row(|idx| {
                Ok(match idx {
                    0 => RowValues::Int(1),
                    1 => RowValues::Text("a".into()),
                    _ => RowValues::Blob(vec![0xde, 0xad]),
                })
            })
            .unwrap();
        assert_eq!(record.get("id"), Some(&RowValues::Int(1)));
        assert_eq!(record.get("payload"), Some(&RowValues::Blob(vec![0xde, 0xad])));
        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["id", "name", "payload"]);
    }

    #[test]
    fn slot_count_mismatch_is_an_error() {
        let binder = RowBinder::new(vec!["a".into(), "b".into()]);
        let err = binder.bind(vec![RowValues::Null]).unwrap_err();
        assert!(matches!(err, SqlRecordError::Binder(_)));
    }

    #[test]
    fn duplicate_columns_keep_last_value() {
        let binder = RowBinder::new(vec!["id".into(), "id".into()]);
        let record = binder
            .bind(vec![RowValues::Int(1), RowValues::Int(2)])
            .unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("id"), Some(&RowValues::Int(2)));
    }

    #[test]
    fn fetch_errors_stop_the_scan() {
        let binder = RowBinder::new(vec!["a".into(), "b".into()]);
        let mut calls = 0;
        let err = binder
            .scan_row(|_| {
                calls += 1;
                Err(SqlRecordError::Other("boom".into()))
            })
            .unwrap_err();
        assert!(matches!(err, SqlRecordError::Other(_)));
        assert_eq!(calls, 1);
    }
}
