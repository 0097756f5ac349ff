//! Per-call connection lifecycle.
//!
//! # Invariants
//! - Returned connections honor `StoreConfig::foreign_keys`.
//! - Returned connections carry the configured busy timeout.
//! - Every opened connection is either closed here or dropped by the caller.

use super::DbResult;
use crate::config::StoreConfig;
use log::{debug, error};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens one SQLite connection to an already resolved database path.
///
/// # Side effects
/// - Creates the database file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_connection(path: &Path, config: &StoreConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    debug!(
        "event=db_open module=db status=start path={}",
        path.display()
    );

    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match configure_connection(&conn, config) {
        Ok(()) => {
            debug!(
                "event=db_open module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_configure_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

/// Closes a connection and surfaces the close error, if any.
///
/// On failure rusqlite hands the connection back; it is dropped here so the
/// handle is released either way.
pub fn close_connection(conn: Connection) -> DbResult<()> {
    match conn.close() {
        Ok(()) => {
            debug!("event=db_close module=db status=ok");
            Ok(())
        }
        Err((_conn, err)) => {
            error!(
                "event=db_close module=db status=error error_code=db_close_failed error={}",
                err
            );
            Err(err.into())
        }
    }
}

fn configure_connection(conn: &Connection, config: &StoreConfig) -> rusqlite::Result<()> {
    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{close_connection, open_connection};
    use crate::config::StoreConfig;

    #[test]
    fn open_applies_foreign_key_pragma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pragma.db3");

        let conn = open_connection(&path, &StoreConfig::default()).unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
        close_connection(conn).unwrap();

        let config = StoreConfig {
            foreign_keys: false,
            ..StoreConfig::default()
        };
        let conn = open_connection(&path, &config).unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 0);
        close_connection(conn).unwrap();
    }
}
