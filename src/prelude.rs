//! Convenient imports for common functionality.
//!
//! `use sql_record::prelude::*;` brings in the record and builder types, the database handle,
//! models, transactions and the [`Executor`](crate::Executor) trait whose methods they share.

pub use crate::builder::{
    GlueOperator, Statement, build_bulk_insert, build_delete, build_find, build_first,
    build_insert, build_update,
};
pub use crate::config::{ConnectArgs, ConnectOptions};
pub use crate::database::Database;
pub use crate::error::{BuildError, SqlRecordError};
pub use crate::executor::{ExecOutcome, Executor};
pub use crate::model::Model;
pub use crate::record::Record;
pub use crate::schema::{FieldNaming, Schema, TypedModel};
pub use crate::transaction::{
    Tx, TxFuture, run_in_transaction, run_in_transaction_with_timeout,
};
pub use crate::types::{DatabaseType, RowValues, SortOrder};
pub use crate::{impl_schema, record};
