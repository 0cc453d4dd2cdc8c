//! Column type descriptors
//!
//! A [`ColumnType`] is a small tree: scalar leaves, constraint modifiers wrapping
//! one child, arrays, named composites, closed enums and foreign keys into
//! another registered record type. It renders the DDL fragment for CREATE TABLE,
//! the raw storage type used by arrays and references, and the one-time type
//! creation statements enums and composites need.

use super::column::Column;
use super::record_schema::RecordSchema;
use crate::core::sql::{literal, qualified, quote_identifier};
use crate::core::{DatabaseError, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Built-in scalar types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// INTEGER
    Integer,
    /// SERIAL (stored as INTEGER, filled by the server)
    Serial,
    /// DOUBLE PRECISION
    Real,
    /// TEXT
    Text,
    /// BOOLEAN
    Boolean,
    /// TIMESTAMP
    Timestamp,
    /// TIMESTAMP WITH TIME ZONE
    TimestampTz,
    /// DATE
    Date,
    /// TIME
    Time,
    /// JSON
    Json,
    /// JSONB
    Jsonb,
    /// VARCHAR(n)
    Varchar(u32),
    /// CHAR(n)
    Char(u32),
    /// NUMERIC(precision, scale)
    Numeric { precision: u32, scale: u32 },
}

impl ScalarType {
    /// Type name as written in DDL
    pub fn declared_name(&self) -> String {
        match self {
            ScalarType::Integer => "INTEGER".to_string(),
            ScalarType::Serial => "SERIAL".to_string(),
            ScalarType::Real => "DOUBLE PRECISION".to_string(),
            ScalarType::Text => "TEXT".to_string(),
            ScalarType::Boolean => "BOOLEAN".to_string(),
            ScalarType::Timestamp => "TIMESTAMP".to_string(),
            ScalarType::TimestampTz => "TIMESTAMP WITH TIME ZONE".to_string(),
            ScalarType::Date => "DATE".to_string(),
            ScalarType::Time => "TIME".to_string(),
            ScalarType::Json => "JSON".to_string(),
            ScalarType::Jsonb => "JSONB".to_string(),
            ScalarType::Varchar(n) => format!("VARCHAR({})", n),
            ScalarType::Char(n) => format!("CHAR({})", n),
            ScalarType::Numeric { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
        }
    }

    /// Type the server actually stores
    pub fn storage_name(&self) -> String {
        match self {
            ScalarType::Serial => "INTEGER".to_string(),
            other => other.declared_name(),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            ScalarType::Varchar(0) | ScalarType::Char(0) => {
                Err(format!("{} needs a positive length", self.declared_name()))
            }
            ScalarType::Numeric { precision, scale } => {
                if *precision == 0 || *precision > crate::codec::fixed_point::MAX_PRECISION {
                    Err(format!("{} precision out of range", self.declared_name()))
                } else if scale > precision {
                    Err(format!("{} scale exceeds precision", self.declared_name()))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

/// Closed set of string literals backed by a server-side enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    name: String,
    variants: Vec<String>,
}

impl EnumType {
    /// Server-side type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Legal literals, in declaration order
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Check membership
    pub fn contains(&self, literal: &str) -> bool {
        self.variants.iter().any(|variant| variant == literal)
    }

    /// Idempotent `CREATE TYPE ... AS ENUM`
    pub fn initialize_statement(&self) -> String {
        let literals: Vec<String> = self
            .variants
            .iter()
            .map(|variant| literal(Some(variant)))
            .collect();
        create_type_statement(
            &self.name,
            &format!("ENUM ({})", literals.join(", ")),
        )
    }
}

/// Named structured type grouping several fields into one column
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeType {
    name: String,
    fields: Vec<Column>,
}

impl CompositeType {
    /// Server-side type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Column] {
        &self.fields
    }

    /// Idempotent `CREATE TYPE ... AS (...)`
    pub fn initialize_statement(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                format!(
                    "{} {}",
                    quote_identifier(field.name()),
                    field.column_type().raw_type()
                )
            })
            .collect();
        create_type_statement(&self.name, &format!("({})", fields.join(", ")))
    }
}

fn create_type_statement(name: &str, body: &str) -> String {
    format!(
        "DO $$ BEGIN CREATE TYPE {} AS {}; EXCEPTION WHEN duplicate_object THEN null; END $$;",
        quote_identifier(name),
        body
    )
}

/// Reference to a column of another registered record type
#[derive(Debug, Clone)]
pub struct ForeignKey {
    target: Arc<RecordSchema>,
    column_index: usize,
}

impl ForeignKey {
    /// Referenced record type
    pub fn target(&self) -> &Arc<RecordSchema> {
        &self.target
    }

    /// Referenced column
    pub fn target_column(&self) -> &Column {
        &self.target.columns()[self.column_index]
    }

    /// Position of the referenced column in the target's columns
    pub fn column_index(&self) -> usize {
        self.column_index
    }
}

impl PartialEq for ForeignKey {
    fn eq(&self, other: &Self) -> bool {
        self.column_index == other.column_index
            && (Arc::ptr_eq(&self.target, &other.target)
                || (self.target.type_name() == other.target.type_name()
                    && self.target.schema_name() == other.target.schema_name()
                    && self.target.table_name() == other.target.table_name()))
    }
}

/// Storage type of one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Built-in scalar
    Scalar(ScalarType),
    /// Adds NOT NULL; encoding null fails
    NotNull(Box<ColumnType>),
    /// Adds UNIQUE
    Unique(Box<ColumnType>),
    /// Adds PRIMARY KEY
    PrimaryKey(Box<ColumnType>),
    /// Array of the element type, optionally with a declared length
    Array {
        element: Box<ColumnType>,
        length: Option<usize>,
    },
    /// Named composite type
    Composite(CompositeType),
    /// Named enum type
    Enum(EnumType),
    /// Reference to another record type
    ForeignKey(ForeignKey),
}

impl ColumnType {
    /// INTEGER
    pub fn integer() -> Self {
        ColumnType::Scalar(ScalarType::Integer)
    }

    /// SERIAL
    pub fn serial() -> Self {
        ColumnType::Scalar(ScalarType::Serial)
    }

    /// DOUBLE PRECISION
    pub fn real() -> Self {
        ColumnType::Scalar(ScalarType::Real)
    }

    /// TEXT
    pub fn text() -> Self {
        ColumnType::Scalar(ScalarType::Text)
    }

    /// BOOLEAN
    pub fn boolean() -> Self {
        ColumnType::Scalar(ScalarType::Boolean)
    }

    /// TIMESTAMP
    pub fn timestamp() -> Self {
        ColumnType::Scalar(ScalarType::Timestamp)
    }

    /// TIMESTAMP WITH TIME ZONE
    pub fn timestamp_tz() -> Self {
        ColumnType::Scalar(ScalarType::TimestampTz)
    }

    /// DATE
    pub fn date() -> Self {
        ColumnType::Scalar(ScalarType::Date)
    }

    /// TIME
    pub fn time() -> Self {
        ColumnType::Scalar(ScalarType::Time)
    }

    /// JSON
    pub fn json() -> Self {
        ColumnType::Scalar(ScalarType::Json)
    }

    /// JSONB
    pub fn jsonb() -> Self {
        ColumnType::Scalar(ScalarType::Jsonb)
    }

    /// VARCHAR(n)
    pub fn varchar(length: u32) -> Self {
        ColumnType::Scalar(ScalarType::Varchar(length))
    }

    /// CHAR(n)
    pub fn char(length: u32) -> Self {
        ColumnType::Scalar(ScalarType::Char(length))
    }

    /// NUMERIC(precision, scale)
    pub fn numeric(precision: u32, scale: u32) -> Self {
        ColumnType::Scalar(ScalarType::Numeric { precision, scale })
    }

    /// Closed enum backed by a server-side type
    pub fn enumeration<N, I, S>(name: N, variants: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnType::Enum(EnumType {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        })
    }

    /// Composite backed by a server-side type
    pub fn composite(name: impl Into<String>, fields: Vec<Column>) -> Self {
        ColumnType::Composite(CompositeType {
            name: name.into(),
            fields,
        })
    }

    /// Variable-length array
    pub fn array(element: ColumnType) -> Self {
        ColumnType::Array {
            element: Box::new(element),
            length: None,
        }
    }

    /// Array with a declared length
    pub fn array_of_length(element: ColumnType, length: usize) -> Self {
        ColumnType::Array {
            element: Box::new(element),
            length: Some(length),
        }
    }

    /// Reference to the primary key of `target`
    pub fn foreign_key(target: &Arc<RecordSchema>) -> Result<Self> {
        let column_index = target.primary_key_index().ok_or_else(|| {
            DatabaseError::primary_key(
                target.type_name(),
                "cannot reference a record type without a primary key",
            )
        })?;
        Ok(ColumnType::ForeignKey(ForeignKey {
            target: Arc::clone(target),
            column_index,
        }))
    }

    /// Reference to a named column of `target`
    ///
    /// The target still needs a primary key: referenced records are persisted by upsert.
    pub fn foreign_key_to(target: &Arc<RecordSchema>, column: &str) -> Result<Self> {
        Self::foreign_key(target)?;
        let column_index = target
            .column_index(column)
            .ok_or_else(|| DatabaseError::ColumnNotFound(format!("{}.{}", target.type_name(), column)))?;
        Ok(ColumnType::ForeignKey(ForeignKey {
            target: Arc::clone(target),
            column_index,
        }))
    }

    /// Wrap in NOT NULL
    #[must_use]
    pub fn not_null(self) -> Self {
        ColumnType::NotNull(Box::new(self))
    }

    /// Wrap in UNIQUE
    #[must_use]
    pub fn unique(self) -> Self {
        ColumnType::Unique(Box::new(self))
    }

    /// Wrap in PRIMARY KEY
    #[must_use]
    pub fn primary_key(self) -> Self {
        ColumnType::PrimaryKey(Box::new(self))
    }

    /// DDL fragment for CREATE TABLE
    pub fn type_statement(&self) -> String {
        match self {
            ColumnType::Scalar(scalar) => scalar.declared_name(),
            ColumnType::NotNull(inner) => format!("{} NOT NULL", inner.type_statement()),
            ColumnType::Unique(inner) => format!("{} UNIQUE", inner.type_statement()),
            ColumnType::PrimaryKey(inner) => format!("{} PRIMARY KEY", inner.type_statement()),
            ColumnType::Array { .. } => self.raw_type(),
            ColumnType::Composite(composite) => quote_identifier(&composite.name),
            ColumnType::Enum(enumeration) => quote_identifier(&enumeration.name),
            ColumnType::ForeignKey(fk) => format!(
                "{} REFERENCES {} ({})",
                self.raw_type(),
                qualified(fk.target.schema_name(), fk.target.table_name()),
                quote_identifier(fk.target_column().name())
            ),
        }
    }

    /// Storage type without constraints
    pub fn raw_type(&self) -> String {
        match self {
            ColumnType::Scalar(scalar) => scalar.storage_name(),
            ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner) => {
                inner.raw_type()
            }
            ColumnType::Array { element, length } => match length {
                Some(n) => format!("{}[{}]", element.raw_type(), n),
                None => format!("{}[]", element.raw_type()),
            },
            ColumnType::Composite(composite) => quote_identifier(&composite.name),
            ColumnType::Enum(enumeration) => quote_identifier(&enumeration.name),
            ColumnType::ForeignKey(fk) => fk.target_column().column_type().raw_type(),
        }
    }

    /// Whether this type marks its column as the primary key
    pub fn is_primary(&self) -> bool {
        match self {
            ColumnType::PrimaryKey(_) => true,
            ColumnType::NotNull(inner) | ColumnType::Unique(inner) => inner.is_primary(),
            _ => false,
        }
    }

    /// Whether values are arrays
    pub fn is_array(&self) -> bool {
        match self {
            ColumnType::Array { .. } => true,
            ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner) => {
                inner.is_array()
            }
            _ => false,
        }
    }

    /// Whether any foreign key appears in this type
    pub fn has_references(&self) -> bool {
        match self {
            ColumnType::ForeignKey(_) => true,
            ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner) => {
                inner.has_references()
            }
            ColumnType::Array { element, .. } => element.has_references(),
            ColumnType::Composite(composite) => composite
                .fields
                .iter()
                .any(|field| field.column_type().has_references()),
            ColumnType::Scalar(_) | ColumnType::Enum(_) => false,
        }
    }

    /// One-time server-side type creation, children first
    pub fn initialize_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        self.collect_initialize_statements(&mut statements);
        statements
    }

    fn collect_initialize_statements(&self, out: &mut Vec<String>) {
        match self {
            ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner) => {
                inner.collect_initialize_statements(out)
            }
            ColumnType::Array { element, .. } => element.collect_initialize_statements(out),
            ColumnType::Composite(composite) => {
                for field in &composite.fields {
                    field.column_type().collect_initialize_statements(out);
                }
                out.push(composite.initialize_statement());
            }
            ColumnType::Enum(enumeration) => out.push(enumeration.initialize_statement()),
            ColumnType::Scalar(_) | ColumnType::ForeignKey(_) => {}
        }
    }

    fn is_key_constraint(&self) -> bool {
        match self {
            ColumnType::Unique(_) | ColumnType::PrimaryKey(_) => true,
            ColumnType::NotNull(inner) => inner.is_key_constraint(),
            _ => false,
        }
    }

    /// Structural checks run at registration
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        match self {
            ColumnType::Scalar(scalar) => scalar.validate(),
            ColumnType::NotNull(inner) | ColumnType::Unique(inner) | ColumnType::PrimaryKey(inner) => {
                inner.validate()
            }
            ColumnType::Array { element, length } => {
                if *length == Some(0) {
                    return Err("array length must be positive".to_string());
                }
                if matches!(
                    element.as_ref(),
                    ColumnType::NotNull(_) | ColumnType::Unique(_) | ColumnType::PrimaryKey(_)
                ) {
                    return Err(
                        "array elements cannot be NOT NULL, UNIQUE or PRIMARY KEY".to_string()
                    );
                }
                element.validate()
            }
            ColumnType::Composite(composite) => {
                if composite.name.is_empty() {
                    return Err("composite type needs a name".to_string());
                }
                if composite.fields.is_empty() {
                    return Err(format!("composite {} has no fields", composite.name));
                }
                let mut seen = HashSet::new();
                for field in &composite.fields {
                    field.validate_name()?;
                    if !seen.insert(field.name()) {
                        return Err(format!(
                            "composite {} declares {} twice",
                            composite.name,
                            field.name()
                        ));
                    }
                    if field.column_type().is_key_constraint() {
                        return Err(format!(
                            "composite field {}.{} cannot be UNIQUE or PRIMARY KEY",
                            composite.name,
                            field.name()
                        ));
                    }
                    field.column_type().validate()?;
                }
                Ok(())
            }
            ColumnType::Enum(enumeration) => {
                if enumeration.name.is_empty() {
                    return Err("enum type needs a name".to_string());
                }
                if enumeration.variants.is_empty() {
                    return Err(format!("enum {} has no literals", enumeration.name));
                }
                let mut seen = HashSet::new();
                for variant in &enumeration.variants {
                    if !seen.insert(variant.as_str()) {
                        return Err(format!(
                            "enum {} declares {:?} twice",
                            enumeration.name, variant
                        ));
                    }
                }
                Ok(())
            }
            ColumnType::ForeignKey(_) => Ok(()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_statement())
    }
}
