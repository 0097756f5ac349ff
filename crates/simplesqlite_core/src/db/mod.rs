//! SQLite connection bootstrap and database path resolution.
//!
//! # Responsibility
//! - Resolve caller-supplied database paths to absolute file paths.
//! - Open and configure one short-lived SQLite connection per call.
//!
//! # Invariants
//! - A connection is never opened when the database directory is missing.
//! - Connections are never cached or shared between calls.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod open;
mod path;

pub use open::{close_connection, open_connection};
pub use path::resolve_db_path;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Containing directory of the resolved database file does not exist.
    MissingDirectory {
        path: PathBuf,
    },
    /// Current working directory could not be determined.
    WorkingDirectory(std::io::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingDirectory { path } => write!(
                f,
                "directory for database `{}` does not exist",
                path.display()
            ),
            Self::WorkingDirectory(err) => {
                write!(f, "failed to resolve current working directory: {err}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingDirectory { .. } => None,
            Self::WorkingDirectory(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
