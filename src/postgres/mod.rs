// PostgreSQL module - deadpool pool, one pooled client per operation or transaction
//
// - config: pool construction from a connection string
// - params: `ToSql` for `RowValues`
// - query: row extraction into records
// - connection: statement execution shared by the pool handle and transactions
// - transaction: client-owning transaction handle

pub mod config;
pub mod connection;
pub mod params;
pub mod query;
pub mod transaction;

pub use config::build_pool;
pub use connection::PgHandle;
pub use params::Params;
pub use transaction::PgTx;
