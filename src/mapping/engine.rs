//! Mapping engine
//!
//! Runs the CRUD protocol for registered record types against any
//! [`DatabaseObject`]. Every round-trip is awaited in order; nothing inside an
//! operation runs concurrently.
//!
//! Statements are logged at `debug` level under the `statement` field.

use super::record::Record;
use super::statements;
use crate::codec::parser;
use crate::core::{DatabaseError, DatabaseObject, DatabaseRow, Filter, Result, Value};
use crate::schema::RecordSchema;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Whether values go through the column codecs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conversion {
    /// Encode and decode through each column's type, resolving and cascading
    /// foreign keys
    #[default]
    Typed,
    /// Send each value's own text rendering and keep fetched cells as text
    Raw,
}

/// Flags for [`create_table`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Drop the schema (cascading) before creating it
    pub recreate_schema: bool,
    /// Drop the table (cascading) before creating it
    pub recreate_table: bool,
}

impl TableOptions {
    /// Drop and recreate both schema and table
    pub fn recreate() -> Self {
        Self {
            recreate_schema: true,
            recreate_table: true,
        }
    }
}

async fn execute(db: &dyn DatabaseObject, sql: &str) -> Result<u64> {
    tracing::debug!(statement = %sql, "execute");
    db.execute(sql).await
}

async fn query(db: &dyn DatabaseObject, sql: &str) -> Result<Vec<DatabaseRow>> {
    tracing::debug!(statement = %sql, "query");
    db.query(sql).await
}

fn require_primary_key(schema: &RecordSchema, operation: &str) -> Result<usize> {
    schema.primary_key_index().ok_or_else(|| {
        DatabaseError::primary_key(
            schema.type_name(),
            format!("{} needs a primary key column", operation),
        )
    })
}

/// Create the server-side types, the schema and the table
///
/// Without recreate flags this is idempotent.
pub async fn create_table(
    db: &dyn DatabaseObject,
    schema: &RecordSchema,
    options: TableOptions,
) -> Result<()> {
    let mut initialized = HashSet::new();
    for column in schema.columns() {
        for statement in column.column_type().initialize_statements() {
            if initialized.insert(statement.clone()) {
                execute(db, &statement).await?;
            }
        }
    }

    if options.recreate_schema {
        execute(db, &statements::drop_schema(schema)).await?;
    }
    execute(db, &statements::create_schema(schema)).await?;

    if options.recreate_table {
        execute(db, &statements::drop_table(schema)).await?;
    }
    execute(db, &statements::create_table(schema)).await?;
    Ok(())
}

/// Cells of a fetched row in column order
///
/// `SELECT (a, b)` yields one record-typed cell; a one-column select yields the
/// value itself.
fn row_cells(schema: &RecordSchema, row: &DatabaseRow) -> Result<Vec<Option<String>>> {
    let width = schema.columns().len();
    if row.len() == width {
        return Ok((0..width).map(|idx| row.get(idx).map(str::to_string)).collect());
    }

    let text = match (row.len(), row.get(0)) {
        (1, Some(text)) => text,
        _ => {
            return Err(DatabaseError::decode(
                schema.type_name(),
                &format!("{:?}", row),
                format!("expected {} columns", width),
            ))
        }
    };
    let cells = parser::split_composite(text)?;
    if cells.len() != width {
        return Err(DatabaseError::decode(
            schema.type_name(),
            text,
            format!("expected {} columns, got {}", width, cells.len()),
        ));
    }
    Ok(cells)
}

async fn decode_row(
    db: &dyn DatabaseObject,
    schema: &Arc<RecordSchema>,
    row: &DatabaseRow,
    conversion: Conversion,
) -> Result<Record> {
    let cells = row_cells(schema, row)?;
    let mut values = Vec::with_capacity(cells.len());
    for (column, cell) in schema.columns().iter().zip(cells) {
        let value = match conversion {
            Conversion::Raw => cell.map(Value::Text).unwrap_or(Value::Null),
            Conversion::Typed => {
                let column_type = column.column_type();
                let decoded = column_type
                    .decode(cell.as_deref())
                    .map_err(|e| e.in_column(schema.type_name(), column.name()))?;
                column_type.resolve(db, decoded).await?
            }
        };
        values.push(value);
    }
    Record::from_values(schema, values)
}

/// Lazily fetch the records matching `filter`
///
/// The query runs on first poll; each row is decoded as it is pulled, so a
/// failing row does not hide the rows before it.
pub fn fetch<'a>(
    db: &'a dyn DatabaseObject,
    schema: &'a Arc<RecordSchema>,
    filter: &Filter,
    conversion: Conversion,
) -> BoxStream<'a, Result<Record>> {
    let sql = statements::select(schema, filter);
    stream::once(async move { query(db, &sql).await })
        .flat_map(|result| match result {
            Ok(rows) => stream::iter(rows.into_iter().map(Ok)).left_stream(),
            Err(e) => stream::iter(std::iter::once(Err(e))).right_stream(),
        })
        .then(move |row: Result<DatabaseRow>| async move {
            decode_row(db, schema, &row?, conversion).await
        })
        .boxed()
}

/// Fetch and collect every record matching `filter`
pub async fn instantiate_all(
    db: &dyn DatabaseObject,
    schema: &Arc<RecordSchema>,
    filter: &Filter,
    conversion: Conversion,
) -> Result<Vec<Record>> {
    fetch(db, schema, filter, conversion).try_collect().await
}

/// First record matching `filter`; `NotFound` when there is none
pub async fn instantiate_one(
    db: &dyn DatabaseObject,
    schema: &Arc<RecordSchema>,
    filter: &Filter,
    conversion: Conversion,
) -> Result<Record> {
    let mut records = fetch(db, schema, filter, conversion);
    match records.next().await {
        Some(record) => record,
        None => Err(DatabaseError::not_found(schema.qualified_table(), filter.build())),
    }
}

/// The record whose primary key equals `key`
pub async fn instantiate_from_primary_key(
    db: &dyn DatabaseObject,
    schema: &Arc<RecordSchema>,
    key: impl Into<Value>,
    conversion: Conversion,
) -> Result<Record> {
    let idx = require_primary_key(schema, "instantiate_from_primary_key")?;
    let filter = Filter::new().where_eq(schema.columns()[idx].name(), key);
    instantiate_one(db, schema, &filter, conversion).await
}

/// Cascade and encode the selected columns as `(name, wire text)` pairs
async fn encode_columns(
    db: &dyn DatabaseObject,
    record: &mut Record,
    conversion: Conversion,
    include_auto_filled: bool,
) -> Result<Vec<(usize, Option<String>)>> {
    let schema = Arc::clone(record.schema());
    let mut encoded = Vec::with_capacity(schema.columns().len());
    for (idx, column) in schema.columns().iter().enumerate() {
        if column.is_auto_filled() && !include_auto_filled {
            continue;
        }
        let value = &mut record.values_mut()[idx];
        let text = match conversion {
            Conversion::Raw => value.to_text(),
            Conversion::Typed => {
                let column_type = column.column_type();
                column_type.cascade(db, value).await?;
                column_type
                    .encode(value)
                    .map_err(|e| e.in_column(schema.type_name(), column.name()))?
            }
        };
        encoded.push((idx, text));
    }
    Ok(encoded)
}

fn assignments<'s>(
    schema: &'s RecordSchema,
    encoded: Vec<(usize, Option<String>)>,
) -> Vec<(&'s str, Option<String>)> {
    encoded
        .into_iter()
        .map(|(idx, text)| (schema.columns()[idx].name(), text))
        .collect()
}

/// Insert the record and refresh it from the returned row
///
/// Auto-filled columns are left to the server, so an auto-filled key is always
/// freshly assigned. Referenced records are persisted first.
pub async fn insert(db: &dyn DatabaseObject, record: &mut Record, conversion: Conversion) -> Result<()> {
    let schema = Arc::clone(record.schema());
    let encoded = encode_columns(db, record, conversion, false).await?;
    let sql = statements::insert(&schema, &assignments(&schema, encoded));

    let rows = query(db, &sql).await?;
    let row = rows.first().ok_or_else(|| {
        DatabaseError::query(format!("insert into {} returned no row", schema.qualified_table()))
    })?;

    let cells = row_cells(&schema, row)?;
    let mut refreshed = Vec::with_capacity(cells.len());
    for ((column, cell), current) in schema.columns().iter().zip(cells).zip(record.values()) {
        let value = match conversion {
            Conversion::Raw => cell.map(Value::Text).unwrap_or(Value::Null),
            // Referenced records were just persisted; keep them materialized.
            Conversion::Typed if column.column_type().has_references() && !current.is_null() => {
                current.clone()
            }
            Conversion::Typed => column
                .column_type()
                .decode(cell.as_deref())
                .map_err(|e| e.in_column(schema.type_name(), column.name()))?,
        };
        refreshed.push(value);
    }
    record.replace_values(refreshed);
    Ok(())
}

/// Update every column of the row keyed by the record's primary key
///
/// Returns the number of rows changed: 0 when the key is unset or matches no row.
pub async fn update(db: &dyn DatabaseObject, record: &mut Record, conversion: Conversion) -> Result<u64> {
    let schema = Arc::clone(record.schema());
    let key_idx = require_primary_key(&schema, "update")?;
    if record.primary_key_value().is_none() {
        return Ok(0);
    }

    let encoded = encode_columns(db, record, conversion, true).await?;
    let key = encoded
        .iter()
        .find(|(idx, _)| *idx == key_idx)
        .and_then(|(_, text)| text.clone())
        .ok_or_else(|| DatabaseError::primary_key(schema.type_name(), "primary key encoded as null"))?;
    let key_column = schema.columns()[key_idx].name();
    let sql = statements::update(&schema, &assignments(&schema, encoded), key_column, &key);
    execute(db, &sql).await
}

/// Insert when the key is unset or absent from the table, update otherwise
///
/// The existence probe and the write are separate statements. Run inside a
/// [`TransactionGuard`](crate::core::TransactionGuard) when concurrent writers
/// may target the same key.
pub async fn insert_or_update(
    db: &dyn DatabaseObject,
    record: &mut Record,
    conversion: Conversion,
) -> Result<()> {
    let schema = Arc::clone(record.schema());
    let key_idx = require_primary_key(&schema, "insert_or_update")?;
    let key = match record.primary_key_value() {
        Some(key) => key.clone(),
        None => return insert(db, record, conversion).await,
    };

    let filter = Filter::new()
        .where_eq(schema.columns()[key_idx].name(), key)
        .limit(1);
    let sql = statements::select(&schema, &filter);
    if query(db, &sql).await?.is_empty() {
        insert(db, record, conversion).await
    } else {
        update(db, record, conversion).await.map(|_| ())
    }
}

/// Delete the row keyed by the record's primary key
///
/// Returns whether a row was removed.
pub async fn delete(db: &dyn DatabaseObject, record: &Record) -> Result<bool> {
    let schema = record.schema();
    let key_idx = require_primary_key(schema, "delete")?;
    let key = match record.primary_key_value() {
        Some(key) => key,
        None => return Ok(false),
    };
    let key_column = &schema.columns()[key_idx];
    let key_text = key_column
        .column_type()
        .encode(key)
        .map_err(|e| e.in_column(schema.type_name(), key_column.name()))?
        .ok_or_else(|| DatabaseError::primary_key(schema.type_name(), "primary key encoded as null"))?;

    let sql = statements::delete(schema, key_column.name(), &key_text);
    Ok(execute(db, &sql).await? > 0)
}
