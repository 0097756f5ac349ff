//! Typed table repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the table described by one `Model` type.
//! - Keep SQL generation inside the persistence boundary.
//!
//! # Invariants
//! - Tables are created on demand and never altered.
//! - Auto-increment keys are generated by SQLite and written back on insert.
//! - Query results are ordered by rowid and fully materialized.

use crate::model::{validate_model, Column, Model};
use crate::query::Filter;
use crate::repo::relation::{CascadeDelete, ChildLoader};
use crate::repo::StoreResult;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;

/// Repository interface for one model table.
pub trait TableRepository<T: Model> {
    /// Creates the table when it does not exist yet.
    fn ensure_table(&self) -> StoreResult<()>;
    /// Counts all rows, or rows matching `filter`.
    fn count(&self, filter: Option<&Filter>) -> StoreResult<u64>;
    fn insert(&self, item: &mut T) -> StoreResult<()>;
    /// Inserts all items in one transaction; nothing is kept on failure and
    /// generated keys are written back only after commit.
    fn insert_all(&self, items: &mut [T]) -> StoreResult<()>;
    fn find(&self, key: &Value) -> StoreResult<Option<T>>;
    /// Finds one row and populates its relations.
    fn find_with_children(&self, key: &Value, recursive: bool) -> StoreResult<Option<T>>;
    fn query(&self, filter: Option<&Filter>) -> StoreResult<Vec<T>>;
    /// Writes all non-key columns; returns rows changed (0 when the key is absent).
    fn update(&self, item: &T) -> StoreResult<usize>;
    fn update_all(&self, items: &[T]) -> StoreResult<usize>;
    /// Deletes the row, cascading through declared relations when `recursive`.
    fn delete(&self, item: &T, recursive: bool) -> StoreResult<usize>;
    fn get_children(&self, item: &mut T, recursive: bool) -> StoreResult<()>;
}

/// SQLite-backed table repository borrowing one open connection.
pub struct SqliteTableRepository<'conn, T: Model> {
    conn: &'conn Connection,
    key: &'static Column,
    _model: PhantomData<fn() -> T>,
}

impl<'conn, T: Model> SqliteTableRepository<'conn, T> {
    /// Creates a repository after validating the model's table layout.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let key = validate_model::<T>()?;
        Ok(Self {
            conn,
            key,
            _model: PhantomData,
        })
    }

    /// Inserts one row and returns the generated key, if any. The caller
    /// writes it back once the row is durable.
    fn insert_row(&self, item: &T) -> StoreResult<Option<i64>> {
        let (sql, values) = insert_statement(item);
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(self
            .key
            .auto_increment
            .then(|| self.conn.last_insert_rowid()))
    }

    fn update_row(&self, item: &T) -> StoreResult<usize> {
        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for (column, value) in T::columns().iter().zip(item.to_values()) {
            if column.primary_key {
                continue;
            }
            assignments.push(format!("\"{}\" = ?", column.name));
            values.push(value);
        }
        if assignments.is_empty() {
            return Ok(0);
        }
        values.push(item.primary_key());

        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"{}\" = ?;",
            T::TABLE,
            assignments.join(", "),
            self.key.name
        );
        Ok(self.conn.execute(&sql, params_from_iter(values))?)
    }
}

impl<T: Model> TableRepository<T> for SqliteTableRepository<'_, T> {
    fn ensure_table(&self) -> StoreResult<()> {
        ensure_table::<T>(self.conn)
    }

    fn count(&self, filter: Option<&Filter>) -> StoreResult<u64> {
        let mut sql = format!("SELECT COUNT(*) FROM \"{}\"", T::TABLE);
        let mut values = Vec::new();
        if let Some(filter) = filter {
            let (where_sql, where_values) = filter.compile(T::TABLE, T::columns())?;
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            values = where_values;
        }

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn insert(&self, item: &mut T) -> StoreResult<()> {
        if let Some(rowid) = self.insert_row(item)? {
            item.set_primary_key(rowid);
        }
        Ok(())
    }

    fn insert_all(&self, items: &mut [T]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut generated = Vec::with_capacity(items.len());
        for item in items.iter() {
            generated.push(self.insert_row(item)?);
        }
        tx.commit()?;

        // A rolled-back batch must leave caller-side keys untouched.
        for (item, rowid) in items.iter_mut().zip(generated) {
            if let Some(rowid) = rowid {
                item.set_primary_key(rowid);
            }
        }
        Ok(())
    }

    fn find(&self, key: &Value) -> StoreResult<Option<T>> {
        let filter = Filter::eq(self.key.name, key.clone());
        Ok(fetch_rows::<T>(self.conn, Some(&filter))?.into_iter().next())
    }

    fn find_with_children(&self, key: &Value, recursive: bool) -> StoreResult<Option<T>> {
        let Some(mut item) = self.find(key)? else {
            return Ok(None);
        };
        ChildLoader::new(self.conn, recursive).load_root(&mut item)?;
        Ok(Some(item))
    }

    fn query(&self, filter: Option<&Filter>) -> StoreResult<Vec<T>> {
        fetch_rows::<T>(self.conn, filter)
    }

    fn update(&self, item: &T) -> StoreResult<usize> {
        self.update_row(item)
    }

    fn update_all(&self, items: &[T]) -> StoreResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut changed = 0;
        for item in items {
            changed += self.update_row(item)?;
        }
        tx.commit()?;
        Ok(changed)
    }

    fn delete(&self, item: &T, recursive: bool) -> StoreResult<usize> {
        if !recursive {
            return delete_by_key::<T>(self.conn, self.key, &item.primary_key());
        }

        // Cascade and the row itself commit together.
        let tx = self.conn.unchecked_transaction()?;
        CascadeDelete::new(self.conn).delete_root(item)?;
        let removed = delete_by_key::<T>(self.conn, self.key, &item.primary_key())?;
        tx.commit()?;
        Ok(removed)
    }

    fn get_children(&self, item: &mut T, recursive: bool) -> StoreResult<()> {
        ChildLoader::new(self.conn, recursive).load_root(item)
    }
}

/// Builds the `CREATE TABLE IF NOT EXISTS` statement for one model.
pub fn create_table_sql<T: Model>() -> String {
    let definitions = T::columns()
        .iter()
        .map(column_definition)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({definitions});",
        T::TABLE
    )
}

pub(crate) fn ensure_table<T: Model>(conn: &Connection) -> StoreResult<()> {
    validate_model::<T>()?;
    conn.execute_batch(&create_table_sql::<T>())?;
    debug!("event=ensure_table module=repo status=ok table={}", T::TABLE);
    Ok(())
}

pub(crate) fn fetch_rows<T: Model>(
    conn: &Connection,
    filter: Option<&Filter>,
) -> StoreResult<Vec<T>> {
    let column_list = T::columns()
        .iter()
        .map(|column| format!("\"{}\"", column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("SELECT {column_list} FROM \"{}\"", T::TABLE);
    let mut values = Vec::new();
    if let Some(filter) = filter {
        let (where_sql, where_values) = filter.compile(T::TABLE, T::columns())?;
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
        values = where_values;
    }
    sql.push_str(" ORDER BY rowid ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(T::from_row(row)?);
    }
    Ok(items)
}

pub(crate) fn delete_by_key<T: Model>(
    conn: &Connection,
    key: &Column,
    value: &Value,
) -> StoreResult<usize> {
    let sql = format!("DELETE FROM \"{}\" WHERE \"{}\" = ?1;", T::TABLE, key.name);
    Ok(conn.execute(&sql, [value])?)
}

fn insert_statement<T: Model>(item: &T) -> (String, Vec<Value>) {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for (column, value) in T::columns().iter().zip(item.to_values()) {
        if column.auto_increment {
            continue;
        }
        names.push(format!("\"{}\"", column.name));
        values.push(value);
    }

    if names.is_empty() {
        return (
            format!("INSERT INTO \"{}\" DEFAULT VALUES;", T::TABLE),
            values,
        );
    }

    let placeholders = vec!["?"; names.len()].join(", ");
    (
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({placeholders});",
            T::TABLE,
            names.join(", ")
        ),
        values,
    )
}

fn column_definition(column: &Column) -> String {
    let mut definition = format!("\"{}\" {}", column.name, column.sql_type.as_sql());
    if column.primary_key {
        definition.push_str(" PRIMARY KEY");
    }
    if column.auto_increment {
        definition.push_str(" AUTOINCREMENT");
    }
    if column.not_null {
        definition.push_str(" NOT NULL");
    }
    definition
}
