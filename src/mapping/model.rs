//! Typed record models
//!
//! A [`Model`] is a host type with a registered schema and a conversion to and
//! from [`Record`]. Implementors describe their columns once; the default
//! methods run the mapping engine on their behalf.

use super::engine::{self, Conversion, TableOptions};
use super::record::Record;
use crate::core::{DatabaseObject, Filter, Result, Value};
use crate::schema::{registry, RecordSchema};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::sync::Arc;

/// A host type persisted as one table row
///
/// # Example
///
/// ```
/// use rust_database_models::prelude::*;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Fruit {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Model for Fruit {
///     fn describe() -> Result<RecordSchema> {
///         RecordSchema::builder("Fruit")
///             .auto_filled("id", ColumnType::serial().primary_key())
///             .column("name", ColumnType::text().not_null())
///             .build()
///     }
///
///     fn to_record(&self) -> Result<Record> {
///         Record::from_values(&Self::schema()?, vec![self.id.into(), self.name.clone().into()])
///     }
///
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Self {
///             id: record.get("id")?,
///             name: record.get("name")?,
///         })
///     }
/// }
///
/// let fruit = Fruit { id: None, name: "kiwi".to_string() };
/// assert_eq!(Fruit::schema().unwrap().table_name(), "fruit");
/// assert_eq!(fruit.primary_key_value().unwrap(), None);
/// ```
#[async_trait]
pub trait Model: Clone + Send + Sync + 'static {
    /// Describe the record type; called once, on first use
    fn describe() -> Result<RecordSchema>;

    /// Convert into a record of this type's schema
    fn to_record(&self) -> Result<Record>;

    /// Rebuild from a record of this type's schema
    fn from_record(record: &Record) -> Result<Self>;

    /// Registered schema
    fn schema() -> Result<Arc<RecordSchema>> {
        registry::register::<Self>(Self::describe)
    }

    /// Current primary key value, `None` while unset
    fn primary_key_value(&self) -> Result<Option<Value>> {
        Ok(self.to_record()?.primary_key_value().cloned())
    }

    /// Create the table and any server-side types it needs
    async fn create_table(db: &dyn DatabaseObject, options: TableOptions) -> Result<()> {
        let schema = Self::schema()?;
        engine::create_table(db, &schema, options).await
    }

    /// Every row matching `filter`
    async fn fetch_all(db: &dyn DatabaseObject, filter: &Filter) -> Result<Vec<Self>> {
        let schema = Self::schema()?;
        engine::fetch(db, &schema, filter, Conversion::Typed)
            .and_then(|record| async move { Self::from_record(&record) })
            .try_collect()
            .await
    }

    /// First row matching `filter`
    async fn instantiate_one(db: &dyn DatabaseObject, filter: &Filter) -> Result<Self> {
        let record = engine::instantiate_one(db, &Self::schema()?, filter, Conversion::Typed).await?;
        Self::from_record(&record)
    }

    /// The row with this primary key
    async fn instantiate_from_primary_key(db: &dyn DatabaseObject, key: Value) -> Result<Self> {
        let record =
            engine::instantiate_from_primary_key(db, &Self::schema()?, key, Conversion::Typed).await?;
        Self::from_record(&record)
    }

    /// Insert, then take the server-assigned values
    async fn insert(&mut self, db: &dyn DatabaseObject) -> Result<()> {
        let mut record = self.to_record()?;
        engine::insert(db, &mut record, Conversion::Typed).await?;
        *self = Self::from_record(&record)?;
        Ok(())
    }

    /// Update the stored row; returns the number of rows changed
    async fn update(&mut self, db: &dyn DatabaseObject) -> Result<u64> {
        let mut record = self.to_record()?;
        let changed = engine::update(db, &mut record, Conversion::Typed).await?;
        *self = Self::from_record(&record)?;
        Ok(changed)
    }

    /// Insert or update depending on whether the key is stored
    async fn insert_or_update(&mut self, db: &dyn DatabaseObject) -> Result<()> {
        let mut record = self.to_record()?;
        engine::insert_or_update(db, &mut record, Conversion::Typed).await?;
        *self = Self::from_record(&record)?;
        Ok(())
    }

    /// Delete the stored row; returns whether one was removed
    async fn delete(&self, db: &dyn DatabaseObject) -> Result<bool> {
        engine::delete(db, &self.to_record()?).await
    }
}
