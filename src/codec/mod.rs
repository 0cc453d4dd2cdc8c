//! Value codec
//!
//! Converts between wire text and host [`Value`]s for every [`ColumnType`].
//! `decode` and `encode` are pure. Foreign keys additionally need the database:
//! [`ColumnType::resolve`] turns decoded keys into materialized records and
//! [`ColumnType::cascade`] persists referenced records before their keys are encoded.

pub mod fixed_point;
pub mod parser;
pub mod scalar;

pub use fixed_point::FixedPoint;

use crate::core::{DatabaseError, DatabaseObject, Filter, Result, Value};
use crate::mapping::engine::{self, Conversion};
use crate::schema::ColumnType;
use futures::future::BoxFuture;
use futures::FutureExt;

impl ColumnType {
    /// Decode one wire cell; `None` is SQL NULL
    ///
    /// Foreign keys decode to the bare key value, see [`ColumnType::resolve`].
    pub fn decode(&self, raw: Option<&str>) -> Result<Value> {
        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(Value::Null),
        };

        match self {
            ColumnType::Scalar(scalar) => scalar.decode_text(raw),
            ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner) => {
                inner.decode(Some(raw))
            }
            ColumnType::Array { element, length } => {
                let items = parser::split_array(raw)?;
                if let Some(expected) = *length {
                    if items.len() != expected {
                        let mismatch = DatabaseError::ArrayLengthMismatch {
                            expected,
                            actual: items.len(),
                        };
                        tracing::warn!(sql_type = %self.raw_type(), "{}", mismatch);
                    }
                }
                items
                    .iter()
                    .map(|item| element.decode(item.as_deref()))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
            ColumnType::Composite(composite) => {
                let texts = parser::split_composite(raw)?;
                if texts.len() != composite.fields().len() {
                    return Err(DatabaseError::decode(
                        composite.name(),
                        raw,
                        format!(
                            "expected {} fields, got {}",
                            composite.fields().len(),
                            texts.len()
                        ),
                    ));
                }
                composite
                    .fields()
                    .iter()
                    .zip(&texts)
                    .map(|(field, text)| {
                        field
                            .column_type()
                            .decode(text.as_deref())
                            .map_err(|e| e.in_column(composite.name(), field.name()))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Composite)
            }
            ColumnType::Enum(_) => Ok(Value::Text(raw.to_string())),
            ColumnType::ForeignKey(fk) => fk.target_column().column_type().decode(Some(raw)),
        }
    }

    /// Encode a host value into wire text; `None` is SQL NULL
    ///
    /// Text given for an array or composite is parsed first, so already encoded
    /// values pass through. Referenced records must already carry their key;
    /// run [`ColumnType::cascade`] first.
    pub fn encode(&self, value: &Value) -> Result<Option<String>> {
        match self {
            ColumnType::NotNull(inner) => {
                if value.is_null() {
                    return Err(DatabaseError::NullValue {
                        sql_type: inner.type_statement(),
                    });
                }
                inner.encode(value)
            }
            ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner) => inner.encode(value),
            _ if value.is_null() => Ok(None),
            ColumnType::Scalar(scalar) => scalar.encode_text(value).map(Some),
            ColumnType::Array { element, .. } => match value {
                Value::Array(items) => {
                    let texts = items
                        .iter()
                        .map(|item| element.encode(item))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Some(parser::format_array(&texts, element.is_array())))
                }
                Value::Text(text) => self.encode(&self.decode(Some(text))?),
                other => Err(DatabaseError::type_mismatch(&self.raw_type(), other.type_name())),
            },
            ColumnType::Composite(composite) => match value {
                Value::Composite(values) => {
                    if values.len() != composite.fields().len() {
                        return Err(DatabaseError::type_mismatch(
                            &format!("{} with {} fields", composite.name(), composite.fields().len()),
                            &format!("composite with {} fields", values.len()),
                        ));
                    }
                    let texts = composite
                        .fields()
                        .iter()
                        .zip(values)
                        .map(|(field, value)| {
                            field
                                .column_type()
                                .encode(value)
                                .map_err(|e| e.in_column(composite.name(), field.name()))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Some(parser::format_composite(&texts)))
                }
                Value::Text(text) => self.encode(&self.decode(Some(text))?),
                other => Err(DatabaseError::type_mismatch(composite.name(), other.type_name())),
            },
            ColumnType::Enum(enumeration) => {
                let text = value.to_text().unwrap_or_default();
                if enumeration.contains(&text) {
                    Ok(Some(text))
                } else {
                    Err(DatabaseError::EnumValue {
                        enum_name: enumeration.name().to_string(),
                        value: text,
                        allowed: enumeration.variants().to_vec(),
                    })
                }
            }
            ColumnType::ForeignKey(fk) => {
                let key_type = fk.target_column().column_type();
                match value {
                    Value::Record(record) => {
                        if record.schema().type_name() != fk.target().type_name() {
                            return Err(DatabaseError::type_mismatch(
                                fk.target().type_name(),
                                record.schema().type_name(),
                            ));
                        }
                        match record.value_at(fk.column_index()) {
                            Some(key) if !key.is_null() => key_type.encode(key),
                            _ => Err(DatabaseError::primary_key(
                                fk.target().type_name(),
                                format!(
                                    "referenced record has no {} value yet",
                                    fk.target_column().name()
                                ),
                            )),
                        }
                    }
                    key => key_type.encode(key),
                }
            }
        }
    }

    /// Replace decoded foreign keys with the records they reference
    ///
    /// Each key costs one fetch; a dangling key fails with `NotFound`.
    pub fn resolve<'a>(
        &'a self,
        db: &'a dyn DatabaseObject,
        value: Value,
    ) -> BoxFuture<'a, Result<Value>> {
        async move {
            if value.is_null() || !self.has_references() {
                return Ok(value);
            }

            match (self, value) {
                (
                    ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner),
                    value,
                ) => inner.resolve(db, value).await,
                (ColumnType::Array { element, .. }, Value::Array(items)) => {
                    let mut resolved = Vec::with_capacity(items.len());
                    for item in items {
                        resolved.push(element.resolve(db, item).await?);
                    }
                    Ok(Value::Array(resolved))
                }
                (ColumnType::Composite(composite), Value::Composite(values)) => {
                    let mut resolved = Vec::with_capacity(values.len());
                    for (field, value) in composite.fields().iter().zip(values) {
                        resolved.push(field.column_type().resolve(db, value).await?);
                    }
                    Ok(Value::Composite(resolved))
                }
                (ColumnType::ForeignKey(_), value @ Value::Record(_)) => Ok(value),
                (ColumnType::ForeignKey(fk), key) => {
                    let filter = Filter::new().where_eq(fk.target_column().name(), key);
                    engine::instantiate_one(db, fk.target(), &filter, Conversion::Typed)
                        .await
                        .map(Value::from)
                }
                (_, value) => Ok(value),
            }
        }
        .boxed()
    }

    /// Persist referenced records (insert or update) so their keys can be encoded
    ///
    /// Failures propagate unchanged.
    pub fn cascade<'a>(
        &'a self,
        db: &'a dyn DatabaseObject,
        value: &'a mut Value,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            if !self.has_references() {
                return Ok(());
            }

            match (self, value) {
                (
                    ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner),
                    value,
                ) => inner.cascade(db, value).await,
                (ColumnType::Array { element, .. }, Value::Array(items)) => {
                    for item in items.iter_mut() {
                        element.cascade(db, item).await?;
                    }
                    Ok(())
                }
                (ColumnType::Composite(composite), Value::Composite(values)) => {
                    for (field, value) in composite.fields().iter().zip(values.iter_mut()) {
                        field.column_type().cascade(db, value).await?;
                    }
                    Ok(())
                }
                (ColumnType::ForeignKey(_), Value::Record(record)) => {
                    engine::insert_or_update(db, record, Conversion::Typed).await
                }
                _ => Ok(()),
            }
        }
        .boxed()
    }
}
