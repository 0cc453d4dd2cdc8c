//! Record instances

use crate::core::{DatabaseError, FromValue, Result, Value};
use crate::schema::RecordSchema;
use std::fmt;
use std::sync::Arc;

/// One value per column of a registered record type
///
/// Identity is the primary key value, unset (null) until the first insert
/// when the key is auto-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl Record {
    /// Construct from the caller-supplied columns, in declaration order
    ///
    /// Auto-filled columns are skipped and start null.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use rust_database_models::mapping::Record;
    /// use rust_database_models::schema::{ColumnType, RecordSchema};
    ///
    /// let schema = Arc::new(
    ///     RecordSchema::builder("Fruit")
    ///         .auto_filled("id", ColumnType::serial().primary_key())
    ///         .column("name", ColumnType::text())
    ///         .build()
    ///         .unwrap(),
    /// );
    /// let apple = Record::new(&schema, ["apple"]).unwrap();
    /// assert!(apple.primary_key_value().is_none());
    /// assert_eq!(apple.to_string(), "public.fruit(id=NULL, name=apple)");
    /// ```
    pub fn new<I, V>(schema: &Arc<RecordSchema>, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut values = Vec::with_capacity(schema.columns().len());
        let mut supplied = 0usize;
        for column in schema.columns() {
            if column.is_auto_filled() {
                values.push(Value::Null);
                continue;
            }
            match args.next() {
                Some(value) => {
                    supplied += 1;
                    values.push(value);
                }
                None => break,
            }
        }
        supplied += args.count();

        let required = schema.required_columns().count();
        if supplied != required {
            return Err(DatabaseError::type_mismatch(
                &format!("{} arguments for {}", required, schema.type_name()),
                &format!("{} arguments", supplied),
            ));
        }
        Ok(Self {
            schema: Arc::clone(schema),
            values,
        })
    }

    /// Construct from a full row of values, auto-filled columns included
    pub fn from_values(schema: &Arc<RecordSchema>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.columns().len() {
            return Err(DatabaseError::type_mismatch(
                &format!("{} values for {}", schema.columns().len(), schema.type_name()),
                &format!("{} values", values.len()),
            ));
        }
        Ok(Self {
            schema: Arc::clone(schema),
            values,
        })
    }

    /// Registered schema
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Values in column order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value by position
    pub fn value_at(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Value by column name
    pub fn value(&self, column: &str) -> Result<&Value> {
        let idx = self.index_of(column)?;
        Ok(&self.values[idx])
    }

    /// Typed copy of a column value
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T> {
        let value = self.value(column)?.clone();
        T::from_value(value).map_err(|e| e.in_column(self.schema.type_name(), column))
    }

    /// Replace a column value in memory
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let idx = self.index_of(column)?;
        self.values[idx] = value.into();
        Ok(())
    }

    /// Current primary key value; `None` without a key column or while unset
    pub fn primary_key_value(&self) -> Option<&Value> {
        self.schema
            .primary_key_index()
            .map(|idx| &self.values[idx])
            .filter(|value| !value.is_null())
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    pub(crate) fn replace_values(&mut self, values: Vec<Value>) {
        self.values = values;
    }

    fn index_of(&self, column: &str) -> Result<usize> {
        self.schema.column_index(column).ok_or_else(|| {
            DatabaseError::ColumnNotFound(format!("{}.{}", self.schema.type_name(), column))
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.schema.schema_name(), self.schema.table_name())?;
        for (idx, (column, value)) in self.schema.columns().iter().zip(&self.values).enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", column.name(), value)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn fruit() -> Arc<RecordSchema> {
        Arc::new(
            RecordSchema::builder("Fruit")
                .auto_filled("id", ColumnType::serial().primary_key())
                .column("name", ColumnType::text())
                .column("weight", ColumnType::real())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_new_skips_auto_filled() {
        let record = Record::new(&fruit(), vec![Value::from("kiwi"), Value::from(0.1)]).unwrap();
        assert_eq!(
            record.values(),
            &[Value::Null, Value::from("kiwi"), Value::Real(0.1)]
        );
        assert!(record.primary_key_value().is_none());
    }

    #[test]
    fn test_new_checks_arity() {
        assert!(Record::new(&fruit(), ["kiwi"]).is_err());
        assert!(Record::new(&fruit(), ["a", "b", "c"]).is_err());
    }

    #[test]
    fn test_get_and_set() {
        let mut record = Record::new(&fruit(), vec![Value::from("kiwi"), Value::Null]).unwrap();
        record.set("id", 7).unwrap();
        assert_eq!(record.primary_key_value(), Some(&Value::Int(7)));
        assert_eq!(record.get::<String>("name").unwrap(), "kiwi");
        assert_eq!(record.get::<Option<f64>>("weight").unwrap(), None);
        assert!(matches!(
            record.set("colour", "green"),
            Err(DatabaseError::ColumnNotFound(_))
        ));
        assert!(record.get::<i64>("name").is_err());
        assert_eq!(record.to_string(), "public.fruit(id=7, name=kiwi, weight=NULL)");
    }
}
