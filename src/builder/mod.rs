//! Statement builder: compiles records into `?`-parameterized SQL.
//!
//! Every function here is pure. Table and column names are interpolated verbatim (they are
//! trusted identifiers); values only ever travel through the argument list.

use std::fmt;

use crate::error::BuildError;
use crate::record::Record;
use crate::types::RowValues;

mod dml;
mod select;

pub use dml::{
    build_bulk_insert, build_delete, build_delete_unfiltered, build_insert, build_update,
    build_update_unfiltered,
};
pub use select::{build_find, build_first, build_select};

/// Compiled SQL text plus its positionally aligned arguments.
///
/// The number and order of `?` placeholders in `sql` always matches `args`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<RowValues>,
}

impl Statement {
    /// Wrap hand-written SQL. The caller is responsible for the placeholder/argument alignment.
    #[must_use]
    pub fn raw(sql: impl Into<String>, args: Vec<RowValues>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn args(&self) -> &[RowValues] {
        &self.args
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<RowValues>) {
        (self.sql, self.args)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// How multiple filter predicates are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlueOperator {
    #[default]
    And,
    Or,
}

impl GlueOperator {
    /// `Or` when `use_or` is set, `And` otherwise.
    #[must_use]
    pub fn from_or(use_or: bool) -> Self {
        if use_or { Self::Or } else { Self::And }
    }

    fn separator(self) -> &'static str {
        match self {
            GlueOperator::And => " AND ",
            GlueOperator::Or => " OR ",
        }
    }
}

/// Reject values that can't travel as a bound argument.
fn bindable(field: &str, value: &RowValues) -> Result<RowValues, BuildError> {
    match value {
        RowValues::Order(_) => Err(BuildError::UnbindableValue {
            field: field.to_owned(),
            kind: value.kind(),
        }),
        other => Ok(other.clone()),
    }
}

/// Compile a filter into `key = ?` / `key IS ?` terms, appending each value to `args`.
fn where_clause(
    filter: &Record,
    glue: GlueOperator,
    args: &mut Vec<RowValues>,
) -> Result<String, BuildError> {
    let mut terms = Vec::with_capacity(filter.len());
    for (field, value) in filter {
        if value.is_null() {
            terms.push(format!("{field} IS ?"));
        } else {
            terms.push(format!("{field} = ?"));
        }
        args.push(bindable(field, value)?);
    }
    Ok(terms.join(glue.separator()))
}

fn order_by_clause(order_by: &Record) -> Result<String, BuildError> {
    let mut terms = Vec::with_capacity(order_by.len());
    for (field, value) in order_by {
        let order = value
            .as_order()
            .ok_or_else(|| BuildError::InvalidOrderBy(field.to_owned()))?;
        terms.push(format!("{field} {}", order.as_sql()));
    }
    Ok(terms.join(", "))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests;
