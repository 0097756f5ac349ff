//! Relation traversal for eager loading and cascade delete.
//!
//! # Responsibility
//! - Resolve one-to-many and many-to-one relations declared by
//!   `Model::load_children` / `Model::delete_children`.
//! - Bound recursive traversal on cyclic relation graphs.
//!
//! # Invariants
//! - Within one traversal each `(table, key)` is expanded at most once.
//! - Related tables are created on demand before they are read.
//! - Cascade delete removes related rows before the row that owns them.

use crate::model::{validate_model, Model};
use crate::query::Filter;
use crate::repo::table_repo::{delete_by_key, ensure_table, fetch_rows};
use crate::repo::StoreResult;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::collections::HashSet;

/// Hashable form of a primary key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Null,
    Integer(i64),
    Real(u64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<&Value> for RowKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(number) => Self::Integer(*number),
            Value::Real(number) => Self::Real(number.to_bits()),
            Value::Text(text) => Self::Text(text.clone()),
            Value::Blob(bytes) => Self::Blob(bytes.clone()),
        }
    }
}

type Visited = HashSet<(&'static str, RowKey)>;

fn first_visit<M: Model>(visited: &mut Visited, item: &M) -> bool {
    visited.insert((M::TABLE, RowKey::from(&item.primary_key())))
}

/// Loads relations of one model instance, optionally transitively.
///
/// Handed to `Model::load_children`; models call [`ChildLoader::one_to_many`]
/// and [`ChildLoader::many_to_one`] for each relation field they declare.
pub struct ChildLoader<'conn> {
    conn: &'conn Connection,
    recursive: bool,
    expanded: Visited,
}

impl<'conn> ChildLoader<'conn> {
    pub(crate) fn new(conn: &'conn Connection, recursive: bool) -> Self {
        Self {
            conn,
            recursive,
            expanded: HashSet::new(),
        }
    }

    /// Whether loaded relatives get their own relations populated too.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub(crate) fn load_root<M: Model>(&mut self, item: &mut M) -> StoreResult<()> {
        first_visit(&mut self.expanded, item);
        item.load_children(self)
    }

    /// Loads the rows of `C` whose `foreign_key` column equals `parent_key`.
    pub fn one_to_many<C: Model>(
        &mut self,
        foreign_key: &str,
        parent_key: impl Into<Value>,
    ) -> StoreResult<Vec<C>> {
        ensure_table::<C>(self.conn)?;
        let filter = Filter::eq(foreign_key, parent_key);
        let mut children = fetch_rows::<C>(self.conn, Some(&filter))?;
        if self.recursive {
            for child in children.iter_mut() {
                self.expand(child)?;
            }
        }
        Ok(children)
    }

    /// Loads the row of `P` referenced by `key`. A NULL key loads nothing.
    pub fn many_to_one<P: Model>(&mut self, key: impl Into<Value>) -> StoreResult<Option<P>> {
        let key = key.into();
        if key == Value::Null {
            return Ok(None);
        }

        let key_column = validate_model::<P>()?;
        ensure_table::<P>(self.conn)?;
        let filter = Filter::eq(key_column.name, key);
        let Some(mut parent) = fetch_rows::<P>(self.conn, Some(&filter))?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };
        if self.recursive {
            self.expand(&mut parent)?;
        }
        Ok(Some(parent))
    }

    fn expand<M: Model>(&mut self, item: &mut M) -> StoreResult<()> {
        if first_visit(&mut self.expanded, item) {
            item.load_children(self)?;
        }
        Ok(())
    }
}

/// Deletes rows reached through cascade relations.
///
/// Handed to `Model::delete_children`; traversal is always transitive.
pub struct CascadeDelete<'conn> {
    conn: &'conn Connection,
    visited: Visited,
}

impl<'conn> CascadeDelete<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            visited: HashSet::new(),
        }
    }

    pub(crate) fn delete_root<M: Model>(&mut self, item: &M) -> StoreResult<()> {
        first_visit(&mut self.visited, item);
        item.delete_children(self)
    }

    /// Deletes the rows of `C` whose `foreign_key` column equals `parent_key`.
    ///
    /// Returns the number of `C` rows removed.
    pub fn one_to_many<C: Model>(
        &mut self,
        foreign_key: &str,
        parent_key: impl Into<Value>,
    ) -> StoreResult<usize> {
        ensure_table::<C>(self.conn)?;
        let filter = Filter::eq(foreign_key, parent_key);
        let children = fetch_rows::<C>(self.conn, Some(&filter))?;

        let mut removed = 0;
        for child in &children {
            removed += self.delete_related(child)?;
        }
        Ok(removed)
    }

    /// Deletes the row of `P` referenced by `key`. A NULL key deletes nothing.
    pub fn many_to_one<P: Model>(&mut self, key: impl Into<Value>) -> StoreResult<usize> {
        let key = key.into();
        if key == Value::Null {
            return Ok(0);
        }

        let key_column = validate_model::<P>()?;
        ensure_table::<P>(self.conn)?;
        let filter = Filter::eq(key_column.name, key);
        match fetch_rows::<P>(self.conn, Some(&filter))?.first() {
            Some(parent) => self.delete_related(parent),
            None => Ok(0),
        }
    }

    fn delete_related<M: Model>(&mut self, item: &M) -> StoreResult<usize> {
        if !first_visit(&mut self.visited, item) {
            return Ok(0);
        }
        item.delete_children(self)?;

        let key_column = validate_model::<M>()?;
        delete_by_key::<M>(self.conn, key_column, &item.primary_key())
    }
}

#[cfg(test)]
mod tests {
    use super::RowKey;
    use rusqlite::types::Value;
    use std::collections::HashSet;

    #[test]
    fn row_keys_distinguish_storage_classes() {
        let keys: HashSet<RowKey> = [
            Value::Integer(1),
            Value::Real(1.0),
            Value::Text("1".to_string()),
            Value::Blob(vec![1]),
            Value::Null,
        ]
        .iter()
        .map(RowKey::from)
        .collect();
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn equal_keys_collapse() {
        assert_eq!(
            RowKey::from(&Value::Text("a".to_string())),
            RowKey::from(&Value::Text("a".to_string()))
        );
    }
}
