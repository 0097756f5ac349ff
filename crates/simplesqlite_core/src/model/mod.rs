//! Mapped record types.
//!
//! # Responsibility
//! - Define the `Model` contract a caller-defined record implements to be
//!   stored in its own table.
//! - Describe table layout through static column descriptors.
//!
//! # Invariants
//! - Each model declares exactly one primary key column.
//! - `to_values()` and `from_row()` follow `columns()` order.
//! - Table and column names are plain SQL identifiers.

pub mod ident;

use crate::repo::relation::{CascadeDelete, ChildLoader};
use crate::repo::{StoreError, StoreResult};
use rusqlite::types::Value;
use rusqlite::Row;

/// Storage class of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
}

impl SqlType {
    /// SQL type name used in `CREATE TABLE`.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }
}

/// Static descriptor of one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    /// Key is generated by SQLite on insert. Implies `primary_key` and
    /// requires `SqlType::Integer`.
    pub auto_increment: bool,
    pub not_null: bool,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            primary_key: false,
            auto_increment: false,
            not_null: false,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn auto_increment(mut self) -> Self {
        self.primary_key = true;
        self.auto_increment = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// Record type stored in one table.
///
/// Implementations are usually a handful of lines per type: a `const` column
/// list, value conversion in both directions, and optionally the relation
/// hooks used by eager loading and cascade delete.
pub trait Model: Sized + 'static {
    /// Table name. Also used as the notification label.
    const TABLE: &'static str;

    fn columns() -> &'static [Column];

    /// Primary key value of this instance.
    fn primary_key(&self) -> Value;

    /// Receives the generated key after insert of an auto-increment model.
    fn set_primary_key(&mut self, _rowid: i64) {}

    /// Column values in `columns()` order.
    fn to_values(&self) -> Vec<Value>;

    /// Builds an instance from a row holding all columns in `columns()` order.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Populates relationship fields. Models without relations keep the default.
    fn load_children(&mut self, _loader: &mut ChildLoader<'_>) -> StoreResult<()> {
        Ok(())
    }

    /// Deletes rows reached through cascade relations, before this row goes.
    fn delete_children(&self, _cascade: &mut CascadeDelete<'_>) -> StoreResult<()> {
        Ok(())
    }
}

/// Checks table and column names, the auto-increment column type, and
/// returns the primary key column.
pub(crate) fn validate_model<T: Model>() -> StoreResult<&'static Column> {
    if !ident::is_valid_identifier(T::TABLE) {
        return Err(StoreError::InvalidIdentifier(T::TABLE.to_string()));
    }
    if let Some(column) = T::columns()
        .iter()
        .find(|column| !ident::is_valid_identifier(column.name))
    {
        return Err(StoreError::InvalidIdentifier(column.name.to_string()));
    }

    if let Some(column) = T::columns()
        .iter()
        .find(|column| column.auto_increment && column.sql_type != SqlType::Integer)
    {
        return Err(StoreError::NonIntegerAutoIncrement {
            table: T::TABLE,
            column: column.name,
        });
    }

    let mut keys = T::columns().iter().filter(|column| column.primary_key);
    match (keys.next(), keys.next()) {
        (Some(key), None) => Ok(key),
        _ => Err(StoreError::MissingPrimaryKey(T::TABLE)),
    }
}
