//! The generic key/value container shared by filters, payloads and result rows.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{RowValues, SortOrder};

/// Field name to value mapping.
///
/// Keys keep insertion order, which is the order the statement builder emits columns,
/// predicates and order-by terms in. Equality ignores order. Keys are never checked
/// against a schema: whatever string goes in ends up as a column reference.
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: Vec<(String, RowValues)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field. A replaced field keeps its original position.
    ///
    /// Returns the previous value, if any.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<RowValues>,
    ) -> Option<RowValues> {
        let field = field.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == field) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((field, value));
        None
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&RowValues> {
        self.entries
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, field: &str) -> Option<RowValues> {
        let idx = self.entries.iter().position(|(k, _)| k == field)?;
        Some(self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn contains_key(&self, field: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &RowValues> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when both records name exactly the same fields, in any order.
    #[must_use]
    pub fn same_keys(&self, other: &Record) -> bool {
        self.len() == other.len() && self.keys().all(|k| other.contains_key(k))
    }

    /// Single-field order-by record, e.g. `Record::order_by("id", SortOrder::Desc)`.
    #[must_use]
    pub fn order_by(field: impl Into<String>, order: SortOrder) -> Self {
        Self::new().with(field, order)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl<K: Into<String>, V: Into<RowValues>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, RowValues);
    type IntoIter = std::vec::IntoIter<(String, RowValues)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a RowValues);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, RowValues)>,
        fn(&'a (String, RowValues)) -> (&'a str, &'a RowValues),
    >;

    fn into_iter(self) -> Self::IntoIter {
        let split: fn(&'a (String, RowValues)) -> (&'a str, &'a RowValues) =
            |(k, v)| (k.as_str(), v);
        self.entries.iter().map(split)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Build a [`Record`] from `field => value` pairs.
///
/// ```rust
/// use sql_record::{record, RowValues};
///
/// let payload = record! { "name" => "widget", "qty" => 3 };
/// assert_eq!(payload.get("qty"), Some(&RowValues::Int(3)));
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert($field, $value); )+
        record
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position_on_replace() {
        let mut r = Record::new().with("a", 1).with("b", 2);
        assert_eq!(r.insert("a", 10), Some(RowValues::Int(1)));
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&RowValues::Int(10)));
    }

    #[test]
    fn equality_ignores_order() {
        let left = Record::new().with("a", 1).with("b", "x");
        let right = Record::new().with("b", "x").with("a", 1);
        assert_eq!(left, right);
        assert_ne!(left, right.clone().with("c", RowValues::Null));
    }

    #[test]
    fn same_keys_compares_key_sets() {
        let left = record! { "a" => 1, "b" => 2 };
        let right = record! { "b" => 5, "a" => 6 };
        assert!(left.same_keys(&right));
        assert!(!left.same_keys(&record! { "a" => 1, "c" => 2 }));
        assert!(!left.same_keys(&record! { "a" => 1 }));
    }

    #[test]
    fn serializes_as_json_object() {
        let r = record! { "id" => 1, "name" => "a", "gone" => RowValues::Null };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 1, "name": "a", "gone": null }));
    }

    #[test]
    fn remove_drops_field() {
        let mut r = record! { "a" => 1 };
        assert_eq!(r.remove("a"), Some(RowValues::Int(1)));
        assert!(r.is_empty());
        assert_eq!(r.remove("a"), None);
    }
}
