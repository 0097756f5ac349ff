//! Row predicates.
//!
//! A [`Filter`] is a boolean expression over the columns of one model. It is
//! built from column comparisons and combined with [`Filter::and`],
//! [`Filter::or`] and [`Filter::negate`], then compiled into a parameterized
//! SQL `WHERE` clause by the table repository.
//!
//! # Invariants
//! - Values are always bound as parameters, never spliced into SQL text.
//! - Column names must belong to the model the filter is applied to.

use crate::model::{ident, Column};
use crate::repo::{StoreError, StoreResult};
use rusqlite::types::Value;

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Boolean predicate over one model's columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    /// SQL `LIKE` pattern match (`%` and `_` wildcards).
    Like {
        column: String,
        pattern: String,
    },
    IsNull(String),
    IsNotNull(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    /// Inclusive range check.
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Set membership. An empty set matches no row.
    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::IsNotNull(column.into())
    }

    /// Conjunction. Nested conjunctions are flattened.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Disjunction. Nested disjunctions are flattened.
    pub fn or(self, other: Filter) -> Self {
        match self {
            Self::Or(mut parts) => {
                parts.push(other);
                Self::Or(parts)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Compiles this filter against `columns` into SQL text plus bound values.
    ///
    /// # Errors
    /// - `StoreError::InvalidIdentifier` for names that are not SQL identifiers.
    /// - `StoreError::UnknownColumn` for names absent from `columns`.
    pub fn compile(
        &self,
        table: &'static str,
        columns: &[Column],
    ) -> StoreResult<(String, Vec<Value>)> {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write_sql(table, columns, &mut sql, &mut params)?;
        Ok((sql, params))
    }

    fn write_sql(
        &self,
        table: &'static str,
        columns: &[Column],
        sql: &mut String,
        params: &mut Vec<Value>,
    ) -> StoreResult<()> {
        match self {
            Self::Compare { column, op, value } => {
                let column = checked_column(table, columns, column)?;
                // `= NULL` never matches in SQL; map it to the NULL checks.
                match (op, value) {
                    (CompareOp::Eq, Value::Null) => sql.push_str(&format!("\"{column}\" IS NULL")),
                    (CompareOp::Ne, Value::Null) => {
                        sql.push_str(&format!("\"{column}\" IS NOT NULL"))
                    }
                    _ => {
                        sql.push_str(&format!("\"{column}\" {} ?", op.as_sql()));
                        params.push(value.clone());
                    }
                }
            }
            Self::Between { column, low, high } => {
                let column = checked_column(table, columns, column)?;
                sql.push_str(&format!("\"{column}\" BETWEEN ? AND ?"));
                params.push(low.clone());
                params.push(high.clone());
            }
            Self::In { column, values } => {
                let column = checked_column(table, columns, column)?;
                if values.is_empty() {
                    sql.push('0');
                } else {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    sql.push_str(&format!("\"{column}\" IN ({placeholders})"));
                    params.extend(values.iter().cloned());
                }
            }
            Self::Like { column, pattern } => {
                let column = checked_column(table, columns, column)?;
                sql.push_str(&format!("\"{column}\" LIKE ?"));
                params.push(Value::Text(pattern.clone()));
            }
            Self::IsNull(column) => {
                let column = checked_column(table, columns, column)?;
                sql.push_str(&format!("\"{column}\" IS NULL"));
            }
            Self::IsNotNull(column) => {
                let column = checked_column(table, columns, column)?;
                sql.push_str(&format!("\"{column}\" IS NOT NULL"));
            }
            Self::And(parts) => write_group(table, columns, parts, " AND ", "1", sql, params)?,
            Self::Or(parts) => write_group(table, columns, parts, " OR ", "0", sql, params)?,
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.write_sql(table, columns, sql, params)?;
                sql.push(')');
            }
        }
        Ok(())
    }
}

fn write_group(
    table: &'static str,
    columns: &[Column],
    parts: &[Filter],
    separator: &str,
    empty: &str,
    sql: &mut String,
    params: &mut Vec<Value>,
) -> StoreResult<()> {
    if parts.is_empty() {
        sql.push_str(empty);
        return Ok(());
    }

    sql.push('(');
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            sql.push_str(separator);
        }
        part.write_sql(table, columns, sql, params)?;
    }
    sql.push(')');
    Ok(())
}

fn checked_column<'a>(
    table: &'static str,
    columns: &[Column],
    name: &'a str,
) -> StoreResult<&'a str> {
    if !ident::is_valid_identifier(name) {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    if !columns.iter().any(|column| column.name == name) {
        return Err(StoreError::UnknownColumn {
            table,
            column: name.to_string(),
        });
    }
    Ok(name)
}
