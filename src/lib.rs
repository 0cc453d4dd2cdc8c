//! # Rust Database Models
//!
//! Map Rust record types onto PostgreSQL tables. Each record type is described
//! once as an ordered list of typed columns; the crate derives the DDL from it,
//! converts values to and from the server's text encoding (including arbitrarily
//! nested arrays and composites) and runs the insert/update/upsert/delete/fetch
//! protocol on top.
//!
//! ## Features
//!
//! - **Composable column types**: scalars, `NOT NULL`/`UNIQUE`/`PRIMARY KEY`
//!   modifiers, fixed or variable arrays, named composites, closed enums and
//!   foreign keys to other record types
//! - **Lossless text codec**: nested `{...}` arrays and `(...)` composites with
//!   quoting, escapes and `NULL` markers at any depth
//! - **Exact NUMERIC**: [`FixedPoint`] values with precision and scale
//! - **Foreign key cascade**: referenced records are upserted before the record
//!   that points at them, and materialized again on fetch
//! - **Scoped mutation**: [`mutate`] restores the in-memory record if the change
//!   or its persistence fails
//! - **Async**: every operation is an `async fn` over Tokio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_database_models::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Fruit {
//!     id: Option<i64>,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! impl Model for Fruit {
//!     fn describe() -> Result<RecordSchema> {
//!         RecordSchema::builder("Fruit")
//!             .schema("market")
//!             .auto_filled("id", ColumnType::serial().primary_key())
//!             .column("name", ColumnType::text().not_null())
//!             .column("tags", ColumnType::array(ColumnType::text()))
//!             .build()
//!     }
//!
//!     fn to_record(&self) -> Result<Record> {
//!         Record::from_values(
//!             &Self::schema()?,
//!             vec![self.id.into(), self.name.clone().into(), self.tags.clone().into()],
//!         )
//!     }
//!
//!     fn from_record(record: &Record) -> Result<Self> {
//!         Ok(Self {
//!             id: record.get("id")?,
//!             name: record.get("name")?,
//!             tags: record.get::<Option<Vec<String>>>("tags")?.unwrap_or_default(),
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let db = PostgresDatabase::new();
//!     db.connect(&ConnectionBuilder::from_env()?.build_connection_string()).await?;
//!
//!     Fruit::create_table(&db, TableOptions::default()).await?;
//!
//!     let mut kiwi = Fruit { id: None, name: "kiwi".into(), tags: vec!["green".into()] };
//!     kiwi.insert(&db).await?;
//!
//!     mutate(&db, &mut kiwi, true, |fruit| {
//!         fruit.tags.push("fuzzy".into());
//!         Ok::<_, DatabaseError>(())
//!     })
//!     .await?;
//!
//!     let fetched = Fruit::fetch_all(&db, &Filter::new().where_eq("name", "kiwi")).await?;
//!     println!("{:?}", fetched);
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! src/
//! ├── core/       # errors, values and rows, Database trait, transactions, filters
//! ├── codec/      # nested array/composite grammar, scalar codecs, FixedPoint
//! ├── schema/     # column types, columns, record schemas, registry
//! ├── mapping/    # records, SQL statements, CRUD engine, Model, mutate
//! └── backends/   # PostgreSQL
//! ```

/// Core types and traits
pub mod core;

/// Value codec
pub mod codec;

/// Column type model and record schema registry
pub mod schema;

/// Mapping engine
pub mod mapping;

/// Database backend implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_database_models::prelude::*;
///
/// let ty = ColumnType::array(ColumnType::integer()).not_null();
/// assert_eq!(ty.type_statement(), "INTEGER[] NOT NULL");
/// ```
pub mod prelude {
    pub use crate::codec::FixedPoint;
    pub use crate::core::{
        ConnectionBuilder, Database, DatabaseError, DatabaseResult, DatabaseRow, Filter,
        FromValue, OrderDirection, Result, TransactionGuard, Value,
    };
    pub use crate::mapping::{mutate, Conversion, Model, Persist, Record, TableOptions};
    pub use crate::schema::{Column, ColumnType, RecordSchema};

    #[cfg(feature = "postgres")]
    pub use crate::backends::PostgresDatabase;
}

// Re-export at root level for convenience
pub use codec::FixedPoint;
pub use core::{
    ConnectionBuilder, Database, DatabaseError, DatabaseObject, DatabaseResult, DatabaseRow,
    Filter, FromValue, Result, TransactionGuard, Value,
};
pub use mapping::{mutate, Conversion, Model, Persist, Record, TableOptions};
pub use schema::{Column, ColumnType, RecordSchema};

#[cfg(feature = "postgres")]
pub use backends::PostgresDatabase;
