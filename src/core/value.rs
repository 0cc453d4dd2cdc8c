//! Host value types
//!
//! This module defines the host-side representation of column values and the
//! textual rows returned by the connection collaborator.

use super::error::{DatabaseError, Result};
use crate::codec::fixed_point::FixedPoint;
use crate::codec::{parser, scalar};
use crate::mapping::Record;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Host value that can hold every column type's decoded form
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer (INTEGER, SERIAL)
    Int(i64),
    /// 64-bit floating point (DOUBLE PRECISION)
    Real(f64),
    /// Exact decimal (NUMERIC)
    Numeric(FixedPoint),
    /// String value (TEXT, VARCHAR, CHAR, enum literals)
    Text(String),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Timestamp with time zone
    TimestampTz(DateTime<FixedOffset>),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// JSON document (JSON, JSONB)
    Json(serde_json::Value),
    /// Array, possibly nested
    Array(Vec<Value>),
    /// Composite tuple, ordered like the composite's fields
    Composite(Vec<Value>),
    /// Materialized record referenced through a foreign key
    Record(Box<Record>),
}

impl Value {
    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an f64
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Numeric(v) => Some(v.to_f64()),
            _ => None,
        }
    }

    /// Get the value as a string slice (zero-copy for Text values)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the array elements
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the composite fields
    pub fn as_composite(&self) -> Option<&[Value]> {
        match self {
            Value::Composite(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get the referenced record
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Numeric(_) => "numeric",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Json(_) => "json",
            Value::Array(_) => "array",
            Value::Composite(_) => "composite",
            Value::Record(_) => "record",
        }
    }

    /// Render the value in the server's text encoding without consulting a column type.
    ///
    /// A referenced record renders as its primary-key value.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(v) => Some(scalar::format_bool(*v).to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::Real(v) => Some(scalar::format_real(*v)),
            Value::Numeric(v) => Some(v.to_sql_string()),
            Value::Text(v) => Some(v.clone()),
            Value::Timestamp(v) => Some(v.format(scalar::TIMESTAMP_FORMAT).to_string()),
            Value::TimestampTz(v) => Some(v.format(scalar::TIMESTAMP_TZ_FORMAT).to_string()),
            Value::Date(v) => Some(v.format(scalar::DATE_FORMAT).to_string()),
            Value::Time(v) => Some(v.format(scalar::TIME_FORMAT).to_string()),
            Value::Json(v) => Some(v.to_string()),
            Value::Array(items) => {
                let nested = items.iter().any(|item| matches!(item, Value::Array(_)));
                let texts: Vec<Option<String>> = items.iter().map(Value::to_text).collect();
                Some(parser::format_array(&texts, nested))
            }
            Value::Composite(fields) => {
                let texts: Vec<Option<String>> = fields.iter().map(Value::to_text).collect();
                Some(parser::format_composite(&texts))
            }
            Value::Record(record) => record.primary_key_value().and_then(Value::to_text),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Record(record) => write!(f, "{}", record),
            other => write!(f, "{}", other.to_text().unwrap_or_default()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<FixedPoint> for Value {
    fn from(v: FixedPoint) -> Self {
        Value::Numeric(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Typed extraction of a host value
pub trait FromValue: Sized {
    /// Convert the value, failing with a type mismatch
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T> {
    Err(DatabaseError::type_mismatch(expected, value.type_name()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            other => mismatch("bool", &other),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(v) => Ok(v),
            other => mismatch("int", &other),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(v) => {
                i32::try_from(v).map_err(|_| DatabaseError::type_mismatch("i32", &v.to_string()))
            }
            other => mismatch("int", &other),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value.as_real() {
            Some(v) => Ok(v),
            None => mismatch("real", &value),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v),
            other => mismatch("text", &other),
        }
    }
}

impl FromValue for FixedPoint {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Numeric(v) => Ok(v),
            other => mismatch("numeric", &other),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => mismatch("timestamp", &other),
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampTz(v) => Ok(v),
            other => mismatch("timestamptz", &other),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(v) => Ok(v),
            other => mismatch("date", &other),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(v) => Ok(v),
            other => mismatch("time", &other),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v),
            other => mismatch("json", &other),
        }
    }
}

impl FromValue for Record {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Record(v) => Ok(*v),
            other => mismatch("record", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("array", &other),
        }
    }
}

/// A row of textual database results, cells in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseRow {
    columns: Vec<String>,
    cells: Vec<Option<String>>,
}

impl DatabaseRow {
    /// Create a row from column names and their text cells
    pub fn new(columns: Vec<String>, cells: Vec<Option<String>>) -> Self {
        Self { columns, cells }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cell text by position; `None` for SQL NULL or an out-of-range index
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).and_then(|cell| cell.as_deref())
    }

    /// Cell text by column name
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|column| column == name)
            .and_then(|idx| self.get(idx))
    }
}

/// Multiple rows returned from a query
pub type DatabaseResult = Vec<DatabaseRow>;
