#![allow(dead_code)]

use simplesqlite_core::rusqlite::types::Value;
use simplesqlite_core::rusqlite::Row;
use simplesqlite_core::{
    CascadeDelete, ChildLoader, Column, Model, Operation, SqlType, SqliteOperations, StoreConfig,
    StoreResult,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub products: Vec<Product>,
}

impl Brand {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Model for Brand {
    const TABLE: &'static str = "Brand";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("ID", SqlType::Integer).auto_increment(),
            Column::new("Name", SqlType::Text).not_null(),
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
        vec![Value::Integer(self.id), Value::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> simplesqlite_core::rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            products: Vec::new(),
        })
    }

    fn load_children(&mut self, loader: &mut ChildLoader<'_>) -> StoreResult<()> {
        self.products = loader.one_to_many::<Product>("IDBrand", self.id)?;
        Ok(())
    }

    fn delete_children(&self, cascade: &mut CascadeDelete<'_>) -> StoreResult<()> {
        cascade.one_to_many::<Product>("IDBrand", self.id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub brand_id: Option<i64>,
    pub price: f64,
    pub brand: Option<Brand>,
    pub tags: Vec<Tag>,
}

impl Product {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            price,
            ..Self::default()
        }
    }

    pub fn of_brand(name: &str, price: f64, brand: &Brand) -> Self {
        Self {
            brand_id: Some(brand.id),
            ..Self::new(name, price)
        }
    }

    /// Copy without loaded relations, as a plain row read returns it.
    pub fn row_only(&self) -> Self {
        Self {
            brand: None,
            tags: Vec::new(),
            ..self.clone()
        }
    }
}

impl Model for Product {
    const TABLE: &'static str = "Product";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("ID", SqlType::Integer).auto_increment(),
            Column::new("name", SqlType::Text),
            Column::new("IDBrand", SqlType::Integer),
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
            self.brand_id.into(),
            Value::Real(self.price),
        ]
    }

    fn from_row(row: &Row<'_>) -> simplesqlite_core::rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            brand_id: row.get(2)?,
            price: row.get(3)?,
            ..Self::default()
        })
    }

    fn load_children(&mut self, loader: &mut ChildLoader<'_>) -> StoreResult<()> {
        self.brand = loader.many_to_one::<Brand>(self.brand_id)?;
        self.tags = loader.one_to_many::<Tag>("IDProduct", self.id)?;
        Ok(())
    }

    fn delete_children(&self, cascade: &mut CascadeDelete<'_>) -> StoreResult<()> {
        cascade.one_to_many::<Tag>("IDProduct", self.id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tag {
    pub id: i64,
    pub label: String,
    pub product_id: i64,
}

impl Tag {
    pub fn new(label: &str, product: &Product) -> Self {
        Self {
            id: 0,
            label: label.to_string(),
            product_id: product.id,
        }
    }
}

impl Model for Tag {
    const TABLE: &'static str = "Tags";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("ID", SqlType::Integer).auto_increment(),
            Column::new("Label", SqlType::Text),
            Column::new("IDProduct", SqlType::Integer).not_null(),
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
            Value::Text(self.label.clone()),
            Value::Integer(self.product_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> simplesqlite_core::rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            product_id: row.get(2)?,
        })
    }
}

/// Temporary database directory plus the façade used against it.
pub struct Fixture {
    pub dir: TempDir,
    pub ops: SqliteOperations,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            default_db_file: dir.path().join("DB.db3"),
            ..StoreConfig::default()
        };
        Self {
            dir,
            ops: SqliteOperations::with_config(config),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("store.db3")
    }
}

/// One observed event, reduced to owned data.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub table: String,
    pub operation: Operation,
    pub product_names: Vec<String>,
    pub record_count: usize,
}

/// Subscribes an observer that records every event published by `ops`.
pub fn record_events(ops: &SqliteOperations) -> Arc<Mutex<Vec<Recorded>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    ops.notifications().subscribe(move |event| {
        sink.lock().unwrap().push(Recorded {
            table: event.table.to_string(),
            operation: event.operation,
            product_names: event
                .records_as::<Product>()
                .into_iter()
                .map(|product| product.name.clone())
                .collect(),
            record_count: event.len(),
        });
        Ok(())
    });
    events
}

/// Inserts one brand with three products priced 20/25/30 and tags on the first.
pub fn seed_catalog(fixture: &Fixture) -> (Brand, Vec<Product>, Vec<Tag>) {
    let path = fixture.db_path();
    let mut brand = Brand::new("Cocacola");
    fixture.ops.insert(&mut brand, &path).unwrap();

    let mut products = vec![
        Product::of_brand("refrescos", 20.0, &brand),
        Product::of_brand("jugos", 25.0, &brand),
        Product::of_brand("Cervezas", 30.0, &brand),
    ];
    fixture.ops.insert_all(&mut products, &path).unwrap();

    let mut tags = vec![
        Tag::new("cold", &products[0]),
        Tag::new("sweet", &products[0]),
        Tag::new("citrus", &products[1]),
    ];
    fixture.ops.insert_all(&mut tags, &path).unwrap();

    (brand, products, tags)
}
