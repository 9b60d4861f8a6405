//! Typed deserialization of records through a per-type field table.
//!
//! A [`Schema`] type publishes one [`SchemaDescriptor`], built once and shared, mapping
//! column names to setters. [`TypedModel`] runs [`Model`] reads and pushes every row
//! through that table.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::builder::GlueOperator;
use crate::conversion::FromRowValue;
use crate::error::SqlRecordError;
use crate::executor::Executor;
use crate::model::Model;
use crate::record::Record;
use crate::types::RowValues;

/// How record keys are normalized before they are looked up in a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldNaming {
    /// Keys must match registered names byte for byte.
    #[default]
    Exact,
    /// `createdAt` and `CreatedAt` both become `created_at`.
    SnakeCase,
    /// Keys are lowercased.
    Lowercase,
}

impl FieldNaming {
    #[must_use]
    pub fn normalize(self, key: &str) -> String {
        match self {
            FieldNaming::Exact => key.to_owned(),
            FieldNaming::Lowercase => key.to_lowercase(),
            FieldNaming::SnakeCase => to_snake_case(key),
        }
    }
}

fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // End of an acronym: the `S` in `HTTPServer`.
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

type Setter<S> = Box<dyn Fn(&mut S, &RowValues) -> Result<(), String> + Send + Sync>;

/// Field table for one [`Schema`] type.
pub struct SchemaDescriptor<S> {
    name: &'static str,
    naming: FieldNaming,
    fields: HashMap<String, Setter<S>>,
}

impl<S> fmt::Debug for SchemaDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.fields.keys().collect();
        fields.sort();
        f.debug_struct("SchemaDescriptor")
            .field("name", &self.name)
            .field("naming", &self.naming)
            .field("fields", &fields)
            .finish()
    }
}

impl<S: 'static> SchemaDescriptor<S> {
    #[must_use]
    pub fn builder(name: &'static str) -> SchemaBuilder<S> {
        SchemaBuilder {
            descriptor: SchemaDescriptor {
                name,
                naming: FieldNaming::Exact,
                fields: HashMap::new(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn naming(&self) -> FieldNaming {
        self.naming
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Build an `S` from `record`. Fields absent from the record keep their default.
    ///
    /// # Errors
    /// Returns [`SqlRecordError::SchemaMismatch`] for a key with no registered field or a value
    /// that does not convert to the field's type.
    pub fn deserialize(&self, record: &Record) -> Result<S, SqlRecordError>
    where
        S: Default,
    {
        let mut target = S::default();
        for (key, value) in record {
            let field = self.naming.normalize(key);
            let setter = self.fields.get(&field).ok_or_else(|| {
                SqlRecordError::schema_mismatch(key, format!("{} has no such field", self.name))
            })?;
            setter(&mut target, value).map_err(|message| SqlRecordError::schema_mismatch(key, message))?;
        }
        Ok(target)
    }
}

/// Builder returned by [`SchemaDescriptor::builder`].
pub struct SchemaBuilder<S> {
    descriptor: SchemaDescriptor<S>,
}

impl<S: 'static> SchemaBuilder<S> {
    /// Set the key normalization. Call before registering fields.
    #[must_use]
    pub fn naming(mut self, naming: FieldNaming) -> Self {
        self.descriptor.naming = naming;
        self
    }

    /// Register `name`, converted to `T` and handed to `set`.
    #[must_use]
    pub fn field<T, F>(mut self, name: &str, set: F) -> Self
    where
        T: FromRowValue,
        F: Fn(&mut S, T) + Send + Sync + 'static,
    {
        let setter: Setter<S> = Box::new(move |target, value| {
            set(target, T::from_row_value(value)?);
            Ok(())
        });
        let key = self.descriptor.naming.normalize(name);
        self.descriptor.fields.insert(key, setter);
        self
    }

    #[must_use]
    pub fn build(self) -> SchemaDescriptor<S> {
        self.descriptor
    }
}

/// A type that rows can be deserialized into.
///
/// Usually implemented with [`impl_schema!`](crate::impl_schema).
pub trait Schema: Default + Send + Sized + 'static {
    fn descriptor() -> &'static SchemaDescriptor<Self>;

    /// # Errors
    /// Returns [`SqlRecordError::SchemaMismatch`] as described on
    /// [`SchemaDescriptor::deserialize`].
    fn from_record(record: &Record) -> Result<Self, SqlRecordError> {
        Self::descriptor().deserialize(record)
    }
}

/// Implement [`Schema`] for a struct from a list of `"column" => field: Type` entries.
///
/// ```rust
/// use sql_record::{impl_schema, record, Schema};
///
/// #[derive(Debug, Default)]
/// struct Item {
///     id: i64,
///     display_name: String,
///     qty: Option<i64>,
/// }
///
/// impl_schema!(Item as SnakeCase {
///     "id" => id: i64,
///     "display_name" => display_name: String,
///     "qty" => qty: Option<i64>,
/// });
///
/// let item = Item::from_record(&record! { "id" => 1, "displayName" => "bolt" }).unwrap();
/// assert_eq!(item.display_name, "bolt");
/// assert_eq!(item.qty, None);
/// ```
#[macro_export]
macro_rules! impl_schema {
    ($ty:ident { $($column:literal => $member:ident : $fty:ty),* $(,)? }) => {
        $crate::impl_schema!($ty as Exact { $($column => $member : $fty),* });
    };
    ($ty:ident as $naming:ident { $($column:literal => $member:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Schema for $ty {
            fn descriptor() -> &'static $crate::SchemaDescriptor<Self> {
                static DESCRIPTOR: ::std::sync::LazyLock<$crate::SchemaDescriptor<$ty>> =
                    ::std::sync::LazyLock::new(|| {
                        $crate::SchemaDescriptor::<$ty>::builder(stringify!($ty))
                            .naming($crate::FieldNaming::$naming)
                            $(
                                .field::<$fty, _>($column, |target: &mut $ty, value: $fty| {
                                    target.$member = value;
                                })
                            )*
                            .build()
                    });
                &DESCRIPTOR
            }
        }
    };
}

/// A [`Model`] whose reads come back as `S`.
pub struct TypedModel<S> {
    model: Model,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Clone for TypedModel<S> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            _schema: PhantomData,
        }
    }
}

impl<S> fmt::Debug for TypedModel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedModel")
            .field("model", &self.model)
            .field("schema", &std::any::type_name::<S>())
            .finish()
    }
}

impl<S: Schema> TypedModel<S> {
    #[must_use]
    pub fn new(model: Model) -> Self {
        Self {
            model,
            _schema: PhantomData,
        }
    }

    /// The untyped model, for writes.
    #[must_use]
    pub fn as_model(&self) -> &Model {
        &self.model
    }

    /// # Errors
    /// As [`Model::first`], plus [`SqlRecordError::SchemaMismatch`].
    pub async fn first(&self, filter: &Record, glue: GlueOperator) -> Result<S, SqlRecordError> {
        S::from_record(&self.model.first(filter, glue).await?)
    }

    /// # Errors
    /// As [`Model::first_with`], plus [`SqlRecordError::SchemaMismatch`].
    pub async fn first_with<E>(
        &self,
        exec: &mut E,
        filter: &Record,
        glue: GlueOperator,
    ) -> Result<S, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        S::from_record(&self.model.first_with(exec, filter, glue).await?)
    }

    /// # Errors
    /// As [`Model::find`], plus [`SqlRecordError::SchemaMismatch`].
    pub async fn find(
        &self,
        filter: &Record,
        order_by: Option<&Record>,
        glue: GlueOperator,
    ) -> Result<Vec<S>, SqlRecordError> {
        self.model
            .find(filter, order_by, glue)
            .await?
            .iter()
            .map(S::from_record)
            .collect()
    }

    /// # Errors
    /// As [`Model::find_with`], plus [`SqlRecordError::SchemaMismatch`].
    pub async fn find_with<E>(
        &self,
        exec: &mut E,
        filter: &Record,
        order_by: Option<&Record>,
        glue: GlueOperator,
    ) -> Result<Vec<S>, SqlRecordError>
    where
        E: Executor + ?Sized,
    {
        self.model
            .find_with(exec, filter, order_by, glue)
            .await?
            .iter()
            .map(S::from_record)
            .collect()
    }

    /// # Errors
    /// As [`Model::find_all`], plus [`SqlRecordError::SchemaMismatch`].
    pub async fn find_all(&self) -> Result<Vec<S>, SqlRecordError> {
        self.model.find_all().await?.iter().map(S::from_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[derive(Debug, Default, PartialEq)]
    struct Account {
        id: i64,
        user_name: String,
        avatar: Option<Vec<u8>>,
        active: bool,
    }

    impl_schema!(Account as SnakeCase {
        "id" => id: i64,
        "user_name" => user_name: String,
        "avatar" => avatar: Option<Vec<u8>>,
        "active" => active: bool,
    });

    #[derive(Debug, Default)]
    struct Strict {
        id: i64,
    }

    impl_schema!(Strict { "id" => id: i64 });

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("userName"), "user_name");
        assert_eq!(to_snake_case("UserName"), "user_name");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("user_id"), "user_id");
        assert_eq!(to_snake_case("item2Count"), "item2_count");
        assert_eq!(to_snake_case("ID"), "id");
    }

    #[test]
    fn deserializes_with_normalized_keys() {
        let row = record! {
            "Id" => 7,
            "userName" => RowValues::Blob(b"ada".to_vec()),
            "avatar" => RowValues::Null,
            "ACTIVE" => 1,
        };
        let account = Account::from_record(&row).unwrap();
        assert_eq!(
            account,
            Account {
                id: 7,
                user_name: "ada".into(),
                avatar: None,
                active: true,
            }
        );
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let account = Account::from_record(&record! { "id" => 1 }).unwrap();
        assert_eq!(account.user_name, "");
        assert!(!account.active);
    }

    #[test]
    fn unknown_key_is_a_mismatch() {
        let err = Strict::from_record(&record! { "id" => 1, "extra" => "x" }).unwrap_err();
        assert!(
            matches!(err, SqlRecordError::SchemaMismatch { ref field, .. } if field == "extra"),
            "{err}"
        );
    }

    #[test]
    fn exact_naming_is_case_sensitive() {
        assert!(Strict::from_record(&record! { "ID" => 1 }).is_err());
        assert_eq!(Strict::from_record(&record! { "id" => 3 }).unwrap().id, 3);
    }

    #[test]
    fn conversion_failure_names_the_field() {
        let err = Account::from_record(&record! { "id" => "seven" }).unwrap_err();
        let SqlRecordError::SchemaMismatch { field, message } = err else {
            panic!("expected schema mismatch");
        };
        assert_eq!(field, "id");
        assert!(message.contains("text"), "{message}");
    }

    #[test]
    fn descriptor_is_built_once() {
        let first: *const _ = Account::descriptor();
        let second: *const _ = Account::descriptor();
        assert_eq!(first, second);
        let mut names: Vec<_> = Account::descriptor().field_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["active", "avatar", "id", "user_name"]);
    }
}
