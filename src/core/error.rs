//! Error types for the mapping system
//!
//! This module defines all error types that can occur while registering record
//! types, converting values, and talking to the database.

/// Result type alias for mapping and database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for mapping and database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Connection error (generic)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connection timeout
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Query timeout
    #[error("Query timeout after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// Type conversion error
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Invalid connection string
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Record type failed registration
    #[error("Schema error in {record}: {message}")]
    SchemaError { record: String, message: String },

    /// Null written to a NOT NULL column
    #[error("Attempted to fill not null field of type {sql_type} with null")]
    NullValue { sql_type: String },

    /// Value outside a closed enum's literal set
    #[error("Attempted to insert {value:?} into enum {enum_name} which only accepts {allowed:?}")]
    EnumValue {
        enum_name: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Operation needs a primary key the record type does not have
    #[error("Primary key error in {record}: {message}")]
    PrimaryKey { record: String, message: String },

    /// A lookup returned no rows
    #[error("No row found in {table} {filter}")]
    NotFound { table: String, filter: String },

    /// Declared fixed array length differs from the decoded length.
    ///
    /// Only ever reported as a warning; decoding proceeds.
    #[error("Expected {expected} array items, got {actual}")]
    ArrayLengthMismatch { expected: usize, actual: usize },

    /// Wire text could not be decoded
    #[error("Cannot decode {raw:?} as {sql_type}: {message}")]
    Decode {
        sql_type: String,
        raw: String,
        message: String,
    },

    /// Fixed-point value does not fit its precision
    #[error("Value {value} does not fit NUMERIC({precision}, {scale})")]
    NumericOverflow {
        value: String,
        precision: u32,
        scale: u32,
    },

    /// Failure while converting one column of a record
    #[error("{record}.{column}: {source}")]
    Column {
        record: String,
        column: String,
        #[source]
        source: Box<DatabaseError>,
    },

    /// PostgreSQL error
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    PostgresError(#[from] tokio_postgres::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create a new connection error (generic)
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConnectionError(msg.into())
    }

    /// Create a connection timeout error
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        DatabaseError::ConnectionTimeout { timeout_ms }
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::QueryError(msg.into())
    }

    /// Create a query timeout error
    pub fn query_timeout(timeout_ms: u64) -> Self {
        DatabaseError::QueryTimeout { timeout_ms }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(expected: &str, actual: &str) -> Self {
        DatabaseError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a new transaction error
    pub fn transaction<S: Into<String>>(msg: S) -> Self {
        DatabaseError::TransactionError(msg.into())
    }

    /// Create a schema (registration) error
    pub fn schema(record: impl Into<String>, message: impl Into<String>) -> Self {
        DatabaseError::SchemaError {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a primary key error
    pub fn primary_key(record: impl Into<String>, message: impl Into<String>) -> Self {
        DatabaseError::PrimaryKey {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(table: impl Into<String>, filter: impl Into<String>) -> Self {
        DatabaseError::NotFound {
            table: table.into(),
            filter: filter.into(),
        }
    }

    /// Create a decode error
    pub fn decode(sql_type: &str, raw: &str, message: impl Into<String>) -> Self {
        DatabaseError::Decode {
            sql_type: sql_type.to_string(),
            raw: raw.to_string(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }

    /// Attach the record type and column name to a conversion failure
    pub fn in_column(self, record: &str, column: &str) -> Self {
        DatabaseError::Column {
            record: record.to_string(),
            column: column.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through column context
    pub fn root(&self) -> &DatabaseError {
        match self {
            DatabaseError::Column { source, .. } => source.root(),
            other => other,
        }
    }
}
