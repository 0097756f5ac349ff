//! Store configuration.
//!
//! # Invariants
//! - `default_db_file` is used only when a call passes a blank path.
//! - Configuration is immutable once handed to a façade.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default database filename, resolved against the working directory.
pub const DEFAULT_DB_FILE: &str = "DB.db3";
/// Default time a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Connection settings shared by every call of one façade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Relative or absolute database file used for blank paths.
    pub default_db_file: PathBuf,
    /// Busy timeout applied to each opened connection.
    pub busy_timeout_ms: u64,
    /// Whether `PRAGMA foreign_keys` is enabled on each connection.
    pub foreign_keys: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_db_file: PathBuf::from(DEFAULT_DB_FILE),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}
