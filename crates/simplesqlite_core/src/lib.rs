//! Generic CRUD access to SQLite databases.
//!
//! Record types implement [`Model`]; [`SqliteOperations`] then counts,
//! inserts, reads, updates and deletes them, opening one connection per call
//! and publishing completed writes on its [`NotificationBus`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod query;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use db::DbError;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{Column, Model, SqlType};
pub use notify::{NotificationBus, ObserverError, Operation, OperationEvent, SubscriptionId};
pub use query::{CompareOp, Filter};
pub use repo::relation::{CascadeDelete, ChildLoader};
pub use repo::table_repo::{SqliteTableRepository, TableRepository};
pub use repo::{StoreError, StoreResult};
pub use service::operations::SqliteOperations;

/// Re-exported so model implementations can name `Value` and `Row` without
/// pinning their own rusqlite version.
pub use rusqlite;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
