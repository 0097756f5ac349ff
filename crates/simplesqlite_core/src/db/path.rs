//! Database path resolution.

use super::{DbError, DbResult};
use std::path::{Path, PathBuf};

/// Resolves the database file a call should open.
///
/// Blank paths (empty or whitespace only) resolve to `default_file` inside the
/// current working directory. Other paths are made absolute lexically, without
/// touching symlinks or requiring the file to exist.
///
/// # Errors
/// - `DbError::MissingDirectory` when the containing directory is absent.
/// - `DbError::WorkingDirectory` when a relative path cannot be anchored.
pub fn resolve_db_path(path: &Path, default_file: &Path) -> DbResult<PathBuf> {
    let requested = if is_blank(path) { default_file } else { path };
    let resolved = std::path::absolute(requested).map_err(DbError::WorkingDirectory)?;

    match resolved.parent() {
        Some(parent) if parent.is_dir() => Ok(resolved),
        _ => Err(DbError::MissingDirectory { path: resolved }),
    }
}

fn is_blank(path: &Path) -> bool {
    path.to_string_lossy().trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::{is_blank, resolve_db_path};
    use crate::db::DbError;
    use std::path::Path;

    #[test]
    fn blank_paths_are_detected() {
        assert!(is_blank(Path::new("")));
        assert!(is_blank(Path::new("   ")));
        assert!(!is_blank(Path::new("db.sqlite")));
    }

    #[test]
    fn blank_path_resolves_to_default_in_working_directory() {
        let resolved = resolve_db_path(Path::new("  "), Path::new("DB.db3")).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolved, cwd.join("DB.db3"));
    }

    #[test]
    fn existing_directory_resolves_to_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("store.db3");

        let resolved = resolve_db_path(&target, Path::new("DB.db3")).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, target);
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("store.db3");

        let err = resolve_db_path(&target, Path::new("DB.db3")).unwrap_err();
        match err {
            DbError::MissingDirectory { path } => assert_eq!(path, target),
            other => panic!("unexpected error: {other}"),
        }
    }
}
