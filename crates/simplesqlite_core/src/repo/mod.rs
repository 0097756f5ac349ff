//! Typed table persistence.
//!
//! # Responsibility
//! - Map `Model` types to SQLite tables over one borrowed connection.
//! - Resolve declared relations for eager loading and cascade delete.
//!
//! # Invariants
//! - Repositories never open or close connections themselves.
//! - Storage failures are surfaced unchanged as `StoreError::Db`.

use crate::db::DbError;
use crate::notify::ObserverError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod relation;
pub mod table_repo;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by every store and façade operation.
#[derive(Debug)]
pub enum StoreError {
    /// Connection, path or SQLite failure.
    Db(DbError),
    /// Table or column name is not a plain SQL identifier.
    InvalidIdentifier(String),
    /// Filter refers to a column the model does not declare.
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    /// Model declares no primary key, or more than one.
    MissingPrimaryKey(&'static str),
    /// Auto-increment is declared on a column that is not `INTEGER`.
    NonIntegerAutoIncrement {
        table: &'static str,
        column: &'static str,
    },
    /// A notification observer rejected the event.
    Observer(ObserverError),
}

impl StoreError {
    /// Returns whether this error is the missing-directory precondition failure.
    pub fn is_missing_directory(&self) -> bool {
        matches!(self, Self::Db(DbError::MissingDirectory { .. }))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidIdentifier(name) => write!(f, "invalid SQL identifier `{name}`"),
            Self::UnknownColumn { table, column } => {
                write!(f, "table `{table}` has no column `{column}`")
            }
            Self::MissingPrimaryKey(table) => {
                write!(f, "model `{table}` must declare exactly one primary key")
            }
            Self::NonIntegerAutoIncrement { table, column } => write!(
                f,
                "auto-increment column `{column}` of model `{table}` must be INTEGER"
            ),
            Self::Observer(err) => write!(f, "notification observer failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidIdentifier(_) => None,
            Self::UnknownColumn { .. } => None,
            Self::MissingPrimaryKey(_) => None,
            Self::NonIntegerAutoIncrement { .. } => None,
            Self::Observer(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ObserverError> for StoreError {
    fn from(value: ObserverError) -> Self {
        Self::Observer(value)
    }
}
