//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `simplesqlite_core` linkage and run one CRUD round-trip against a
//!   throwaway database.
//! - Keep output deterministic for quick local sanity checks.

use simplesqlite_core::rusqlite::types::Value;
use simplesqlite_core::rusqlite::Row;
use simplesqlite_core::{Column, Filter, Model, SqlType, SqliteOperations, StoreResult};
use std::process::ExitCode;

struct Product {
    id: i64,
    name: String,
    price: f64,
}

impl Model for Product {
    const TABLE: &'static str = "Product";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("ID", SqlType::Integer).auto_increment(),
            Column::new("name", SqlType::Text),
            Column::new("Price", SqlType::Real).not_null(),
        ];
        COLUMNS
    }

    fn primary_key(&self) -> Value {
        Value::Integer(self.id)
    }

    fn set_primary_key(&mut self, rowid: i64) {
        self.id = rowid;
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.name.clone()),
            Value::Real(self.price),
        ]
    }

    fn from_row(row: &Row<'_>) -> simplesqlite_core::rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
        })
    }
}

fn main() -> ExitCode {
    println!("simplesqlite_core version={}", simplesqlite_core::core_version());

    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("smoke status=error error=temp_dir_failed detail={err}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = dir.path().join("logs");
    if let Err(err) =
        simplesqlite_core::init_logging(simplesqlite_core::default_log_level(), &log_dir)
    {
        eprintln!("smoke status=error error=logging_failed detail={err}");
        return ExitCode::FAILURE;
    }

    match smoke(&dir.path().join("smoke.db3")) {
        Ok(summary) => {
            println!("smoke status=ok {summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("smoke status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke(path: &std::path::Path) -> StoreResult<String> {
    let ops = SqliteOperations::new();
    ops.notifications().subscribe(|event| {
        println!(
            "event table={} operation={} records={}",
            event.table,
            event.operation.as_str(),
            event.len()
        );
        Ok(())
    });

    let before = ops.count::<Product>(path, None)?;
    let mut products: Vec<Product> = [
        ("refrescos", 20.0),
        ("jugos", 25.0),
        ("Cervezas", 30.0),
    ]
    .into_iter()
    .map(|(name, price)| Product {
        id: 0,
        name: name.to_string(),
        price,
    })
    .collect();
    ops.insert_all(&mut products, path)?;

    let matches = ops.read_where::<Product>(Some(&Filter::eq("Price", 30.0)), path)?;
    let matched = matches
        .first()
        .map(|product| product.name.clone())
        .unwrap_or_default();
    ops.delete_all(&products, path, false)?;
    let after = ops.count::<Product>(path, None)?;

    Ok(format!(
        "matched={matched} count_before={before} count_after={after}"
    ))
}
