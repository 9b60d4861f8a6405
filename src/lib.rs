//! Record-oriented data access for `SQLite` and Postgres.
//!
//! Filters, payloads and result rows are all [`Record`]s: ordered maps from column name to
//! [`RowValues`]. The statement builder compiles them into `?`-parameterized SQL, an
//! [`Executor`] runs the SQL, and the row binder turns result sets back into records.
//!
//! ```rust,no_run
//! use sql_record::prelude::*;
//!
//! # #[cfg(feature = "sqlite")]
//! # async fn demo() -> Result<(), SqlRecordError> {
//! let db = Database::open_sqlite(":memory:").await?;
//! db.clone()
//!     .execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, qty INTEGER)")
//!     .await?;
//!
//! let items = db.model("items");
//! let id = items.insert(&record! { "name" => "widget", "qty" => 3 }).await?;
//! items
//!     .update(&record! { "id" => id }, &record! { "qty" => 4 }, GlueOperator::And)
//!     .await?;
//! let rows = items.find_all().await?;
//! assert_eq!(rows[0].get("qty"), Some(&RowValues::Int(4)));
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one of the `sqlite` or `postgres` features");

pub mod binder;
pub mod builder;
pub mod config;
pub mod conversion;
pub mod database;
pub mod error;
pub mod executor;
pub mod model;
pub mod prelude;
pub mod record;
pub mod schema;
pub mod transaction;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use binder::RowBinder;
pub use builder::{
    GlueOperator, Statement, build_bulk_insert, build_delete, build_delete_unfiltered,
    build_find, build_first, build_insert, build_select, build_update, build_update_unfiltered,
};
pub use config::{ConnectArgs, ConnectOptions};
pub use conversion::FromRowValue;
pub use database::{Database, Backend};
pub use error::{BuildError, SqlRecordError};
pub use executor::{ExecOutcome, Executor};
pub use model::Model;
pub use record::Record;
pub use schema::{FieldNaming, Schema, SchemaBuilder, SchemaDescriptor, TypedModel};
pub use transaction::{
    Prepared, Tx, TxFuture, run_in_transaction, run_in_transaction_with_timeout,
};
pub use translation::{PlaceholderStyle, translate_placeholders};
pub use types::{DatabaseType, RowValues, SortOrder};
