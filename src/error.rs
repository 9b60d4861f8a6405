use std::time::Duration;

use thiserror::Error;

/// Reasons the statement builder refuses to compile a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("payload {index} has keys [{found}] but the first payload has [{expected}]")]
    MismatchedPayload {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("{0} requires a non-empty filter")]
    EmptyFilter(&'static str),

    #[error("order-by field '{0}' must carry a sort order")]
    InvalidOrderBy(String),

    #[error("field '{field}' holds a {kind} value, which cannot be bound as an argument")]
    UnbindableValue { field: String, kind: &'static str },
}

#[derive(Debug, Error)]
pub enum SqlRecordError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolError(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    BuildError(#[from] BuildError),

    #[error("SQL execution error: {source} (sql: {sql})")]
    ExecutionError {
        sql: String,
        #[source]
        source: Box<SqlRecordError>,
    },

    #[error("EmptyResult: no row matched the filter")]
    EmptyResult,

    #[error("AmbiguousResult: filter matched at least {0} rows where one was expected")]
    AmbiguousResult(usize),

    #[error("schema mismatch on field '{field}': {message}")]
    SchemaMismatch { field: String, message: String },

    #[error("transaction failed: {cause}; rollback also failed: {rollback}")]
    TransactionError {
        cause: Box<SqlRecordError>,
        rollback: Box<SqlRecordError>,
    },

    #[error("transaction timed out after {0:?}")]
    Timeout(Duration),

    #[error("row binder error: {0}")]
    Binder(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlRecordError {
    /// Attach the SQL text that was running when a driver error surfaced.
    ///
    /// Errors that already carry context, or that are not driver failures, pass through unchanged.
    #[must_use]
    pub fn with_sql(self, sql: &str) -> Self {
        match self {
            #[cfg(feature = "sqlite")]
            err @ SqlRecordError::SqliteError(_) => SqlRecordError::ExecutionError {
                sql: sql.to_owned(),
                source: Box::new(err),
            },
            #[cfg(feature = "postgres")]
            err @ SqlRecordError::PostgresError(_) => SqlRecordError::ExecutionError {
                sql: sql.to_owned(),
                source: Box::new(err),
            },
            err @ SqlRecordError::ParameterError(_) => SqlRecordError::ExecutionError {
                sql: sql.to_owned(),
                source: Box::new(err),
            },
            other => other,
        }
    }

    #[must_use]
    pub fn schema_mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }

    #[must_use]
    pub fn is_ambiguous_result(&self) -> bool {
        matches!(self, Self::AmbiguousResult(_))
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The SQL text attached by [`with_sql`](Self::with_sql), if any.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        if let Self::ExecutionError { sql, .. } = self {
            Some(sql)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_sql_wraps_parameter_errors_only_once() {
        let err = SqlRecordError::ParameterError("bad".into()).with_sql("SELECT 1");
        assert_eq!(err.sql(), Some("SELECT 1"));
        let err = err.with_sql("SELECT 2");
        assert_eq!(err.sql(), Some("SELECT 1"));
    }

    #[test]
    fn with_sql_leaves_cardinality_errors_alone() {
        let err = SqlRecordError::EmptyResult.with_sql("SELECT 1");
        assert!(err.is_empty_result());
        assert_eq!(err.sql(), None);
    }

    #[test]
    fn transaction_error_mentions_both_failures() {
        let err = SqlRecordError::TransactionError {
            cause: Box::new(SqlRecordError::Other("insert failed".into())),
            rollback: Box::new(SqlRecordError::ConnectionError("socket closed".into())),
        };
        let text = err.to_string();
        assert!(text.contains("insert failed"));
        assert!(text.contains("socket closed"));
    }
}
