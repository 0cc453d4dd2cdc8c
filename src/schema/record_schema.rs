//! Record type schemas
//!
//! A [`RecordSchema`] is the registered description of one persisted record type:
//! where its table lives and which columns it has, in declaration order. Schemas
//! are built once through [`RecordSchemaBuilder`], which runs all structural
//! checks, and are shared afterwards behind an `Arc`.

use super::column::Column;
use super::column_type::ColumnType;
use crate::core::sql::qualified;
use crate::core::{DatabaseError, Result};
use std::collections::HashSet;

/// Default server-side namespace
pub const DEFAULT_SCHEMA: &str = "public";

/// Registered description of a persisted record type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    type_name: String,
    schema_name: String,
    table_name: String,
    columns: Vec<Column>,
    primary_key: Option<usize>,
}

impl RecordSchema {
    /// Start describing the record type `type_name`
    pub fn builder(type_name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            type_name: type_name.into(),
            schema_name: None,
            table_name: None,
            inherited: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Host type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Server-side namespace
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// `"schema"."table"`
    pub fn qualified_table(&self) -> String {
        qualified(&self.schema_name, &self.table_name)
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Columns the caller supplies at construction and insert
    pub fn required_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| !column.is_auto_filled())
    }

    /// The primary key column, if declared
    pub fn primary_key(&self) -> Option<&Column> {
        self.primary_key.map(|idx| &self.columns[idx])
    }

    /// Position of the primary key column
    pub fn primary_key_index(&self) -> Option<usize> {
        self.primary_key
    }

    /// Position of the named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    /// Look up a column by name
    pub fn get_column(&self, name: &str) -> Result<&Column> {
        self.column_index(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| DatabaseError::ColumnNotFound(format!("{}.{}", self.type_name, name)))
    }

    /// Whether any column references another record type
    pub fn has_references(&self) -> bool {
        self.columns
            .iter()
            .any(|column| column.column_type().has_references())
    }
}

/// Builder for [`RecordSchema`]
///
/// # Example
///
/// ```
/// use rust_database_models::schema::{ColumnType, RecordSchema};
///
/// let schema = RecordSchema::builder("Fruit")
///     .schema("market")
///     .auto_filled("id", ColumnType::serial().primary_key())
///     .column("name", ColumnType::text().not_null())
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.table_name(), "fruit");
/// assert_eq!(schema.primary_key().unwrap().name(), "id");
/// ```
#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
    type_name: String,
    schema_name: Option<String>,
    table_name: Option<String>,
    inherited: Vec<Column>,
    columns: Vec<Column>,
}

impl RecordSchemaBuilder {
    /// Inherit the columns of `parent`
    ///
    /// Inherited columns come first, with their auto-fill flags. A column declared
    /// here under an inherited name replaces it in place. Namespace and table
    /// are never inherited.
    pub fn extends(mut self, parent: &RecordSchema) -> Self {
        self.inherited.extend(parent.columns().iter().cloned());
        self
    }

    /// Set the namespace (default `public`)
    pub fn schema(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    /// Set the table name (default: the lower-cased type name)
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Add a caller-supplied column
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type));
        self
    }

    /// Add a column the server fills on insert
    pub fn auto_filled(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type).auto_filled());
        self
    }

    /// Validate and build the schema
    pub fn build(self) -> Result<RecordSchema> {
        let type_name = self.type_name;
        let fail = |message: String| DatabaseError::schema(type_name.as_str(), message);

        if type_name.is_empty() {
            return Err(fail("record type needs a name".to_string()));
        }
        let schema_name = self
            .schema_name
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
        let table_name = self
            .table_name
            .unwrap_or_else(|| type_name.to_lowercase());
        if schema_name.is_empty() || table_name.is_empty() {
            return Err(fail("schema and table names cannot be empty".to_string()));
        }

        let inherited = self.inherited.len();
        let mut columns = self.inherited;
        let mut overridden = HashSet::new();
        for column in self.columns {
            let slot = columns[..inherited]
                .iter()
                .position(|c| c.name() == column.name())
                .filter(|idx| overridden.insert(*idx));
            match slot {
                Some(idx) => columns[idx] = column,
                None => columns.push(column),
            }
        }

        if columns.is_empty() {
            return Err(fail("record type has no columns".to_string()));
        }

        let mut seen = HashSet::new();
        let mut primary_key = None;
        for (idx, column) in columns.iter().enumerate() {
            column.validate_name().map_err(&fail)?;
            if !seen.insert(column.name()) {
                return Err(fail(format!("column {} declared twice", column.name())));
            }
            column
                .column_type()
                .validate()
                .map_err(|message| fail(format!("column {}: {}", column.name(), message)))?;
            if column.is_primary() {
                if let Some(previous) = primary_key.replace(idx) {
                    return Err(fail(format!(
                        "both {} and {} are declared primary key",
                        columns[previous].name(),
                        column.name()
                    )));
                }
            }
        }

        Ok(RecordSchema {
            type_name,
            schema_name,
            table_name,
            columns,
            primary_key,
        })
    }
}
