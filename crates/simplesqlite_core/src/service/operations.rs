//! Generic CRUD façade over file-backed SQLite databases.
//!
//! # Responsibility
//! - Provide type-generic Count/Insert/Read/Update/Delete/FillWithChildren
//!   entry points for any `Model`.
//! - Announce completed writes through the owned `NotificationBus`.
//!
//! # Invariants
//! - Every call runs open -> ensure table -> act -> close on its own
//!   connection; nothing is cached between calls.
//! - The connection is released on every exit path.
//! - Notifications are published only after the write succeeded and the
//!   connection was closed.
//! - Read-only calls never publish.

use crate::config::StoreConfig;
use crate::db::{close_connection, open_connection, resolve_db_path};
use crate::model::Model;
use crate::notify::{NotificationBus, Operation, OperationEvent};
use crate::query::Filter;
use crate::repo::table_repo::{SqliteTableRepository, TableRepository};
use crate::repo::StoreResult;
use log::{debug, error};
use rusqlite::types::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// CRUD façade. Cheap to construct; holds configuration and observers only.
///
/// Every `path` argument accepts an absolute or relative database file path;
/// a blank path selects `StoreConfig::default_db_file` in the working
/// directory.
pub struct SqliteOperations {
    config: StoreConfig,
    bus: Arc<NotificationBus>,
}

impl Default for SqliteOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteOperations {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_bus(config, Arc::new(NotificationBus::new()))
    }

    /// Creates a façade publishing to an existing, possibly shared, bus.
    pub fn with_bus(config: StoreConfig, bus: Arc<NotificationBus>) -> Self {
        Self { config, bus }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Bus receiving one event per successful write call.
    pub fn notifications(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    /// Counts rows of `T`, optionally restricted by `filter`.
    pub fn count<T: Model>(
        &self,
        path: impl AsRef<Path>,
        filter: Option<&Filter>,
    ) -> StoreResult<u64> {
        self.with_table::<T, _>("count", path.as_ref(), |repo| repo.count(filter))
    }

    /// Inserts one row and publishes `Insert`.
    ///
    /// Auto-increment keys are written back into `item`.
    pub fn insert<T: Model>(&self, item: &mut T, path: impl AsRef<Path>) -> StoreResult<()> {
        self.with_table::<T, _>("insert", path.as_ref(), |repo| repo.insert(item))?;
        self.publish(std::slice::from_ref(item), Operation::Insert)
    }

    /// Inserts all rows in one transaction and publishes one `Insert` event,
    /// also for an empty slice.
    pub fn insert_all<T: Model>(&self, items: &mut [T], path: impl AsRef<Path>) -> StoreResult<()> {
        self.with_table::<T, _>("insert_all", path.as_ref(), |repo| repo.insert_all(items))?;
        self.publish(items, Operation::Insert)
    }

    /// Reads one row by primary key. `None` when no row matches.
    pub fn read<T: Model>(
        &self,
        key: impl Into<Value>,
        path: impl AsRef<Path>,
    ) -> StoreResult<Option<T>> {
        let key = key.into();
        self.with_table::<T, _>("read", path.as_ref(), |repo| repo.find(&key))
    }

    /// Reads one row by primary key and populates its relations, one level or
    /// transitively when `recursive`.
    pub fn read_with_children<T: Model>(
        &self,
        key: impl Into<Value>,
        path: impl AsRef<Path>,
        recursive: bool,
    ) -> StoreResult<Option<T>> {
        let key = key.into();
        self.with_table::<T, _>("read_with_children", path.as_ref(), |repo| {
            repo.find_with_children(&key, recursive)
        })
    }

    /// Reads all rows, or the rows matching `filter`, in rowid order.
    pub fn read_where<T: Model>(
        &self,
        filter: Option<&Filter>,
        path: impl AsRef<Path>,
    ) -> StoreResult<Vec<T>> {
        self.with_table::<T, _>("read_where", path.as_ref(), |repo| repo.query(filter))
    }

    /// Writes `item` to its row and publishes `Update`. Returns rows changed.
    pub fn update<T: Model>(&self, item: &T, path: impl AsRef<Path>) -> StoreResult<usize> {
        let changed = self.with_table::<T, _>("update", path.as_ref(), |repo| repo.update(item))?;
        self.publish(std::slice::from_ref(item), Operation::Update)?;
        Ok(changed)
    }

    /// Writes all items in one transaction and publishes one `Update` event.
    pub fn update_all<T: Model>(&self, items: &[T], path: impl AsRef<Path>) -> StoreResult<usize> {
        let changed =
            self.with_table::<T, _>("update_all", path.as_ref(), |repo| repo.update_all(items))?;
        self.publish(items, Operation::Update)?;
        Ok(changed)
    }

    /// Deletes `item`'s row and publishes `Delete`. With `recursive`, rows
    /// reached through the model's cascade relations go first.
    pub fn delete<T: Model>(
        &self,
        item: &T,
        path: impl AsRef<Path>,
        recursive: bool,
    ) -> StoreResult<usize> {
        let removed =
            self.with_table::<T, _>("delete", path.as_ref(), |repo| repo.delete(item, recursive))?;
        self.publish(std::slice::from_ref(item), Operation::Delete)?;
        Ok(removed)
    }

    /// Deletes each item independently, applying `recursive` per item.
    ///
    /// Fail-fast: the first failing item aborts the call. Items before it stay
    /// deleted, items after it are not processed, and no event is published.
    pub fn delete_all<T: Model>(
        &self,
        items: &[T],
        path: impl AsRef<Path>,
        recursive: bool,
    ) -> StoreResult<usize> {
        let removed = self.with_table::<T, _>("delete_all", path.as_ref(), |repo| {
            let mut removed = 0;
            for item in items {
                removed += repo.delete(item, recursive)?;
            }
            Ok(removed)
        })?;
        self.publish(items, Operation::Delete)?;
        Ok(removed)
    }

    /// Populates `item`'s relation fields in place. Never publishes.
    pub fn fill_with_children<T: Model>(
        &self,
        item: &mut T,
        path: impl AsRef<Path>,
        recursive: bool,
    ) -> StoreResult<()> {
        self.with_table::<T, _>("fill_with_children", path.as_ref(), |repo| {
            repo.get_children(item, recursive)
        })
    }

    fn with_table<T, R>(
        &self,
        operation: &'static str,
        path: &Path,
        action: impl FnOnce(&SqliteTableRepository<'_, T>) -> StoreResult<R>,
    ) -> StoreResult<R>
    where
        T: Model,
    {
        let started_at = Instant::now();
        let resolved = resolve_db_path(path, &self.config.default_db_file).map_err(|err| {
            error!(
                "event=store_op module=service status=error op={operation} table={} error_code=path_rejected error={}",
                T::TABLE,
                err
            );
            err
        })?;

        let conn = open_connection(&resolved, &self.config)?;
        let result = SqliteTableRepository::<T>::try_new(&conn).and_then(|repo| {
            repo.ensure_table()?;
            action(&repo)
        });

        match result {
            Ok(value) => {
                close_connection(conn)?;
                debug!(
                    "event=store_op module=service status=ok op={operation} table={} duration_ms={}",
                    T::TABLE,
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                drop(conn);
                error!(
                    "event=store_op module=service status=error op={operation} table={} duration_ms={} error={}",
                    T::TABLE,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn publish<T: Model>(&self, records: &[T], operation: Operation) -> StoreResult<()> {
        let event = OperationEvent::from_slice(records, T::TABLE, operation);
        self.bus.publish(&event)?;
        Ok(())
    }
}
