//! `SQLite` backend: one `rusqlite` connection shared behind an async mutex.
//!
//! - `connection`: opening, pragmas, and the blocking-offload helper
//! - `params`: `RowValues` to `rusqlite` value conversion
//! - `query`: result extraction into records
//! - `transaction`: the lock-holding transaction handle

pub mod connection;
pub mod params;
pub mod query;
pub mod transaction;

pub use connection::{SharedSqliteConnection, SqliteHandle};
pub use params::Params;
pub use transaction::SqliteTx;
