//! Database trait and connection management
//!
//! This module defines the connection collaborator the mapping engine runs against.
//! Every backend returns rows in the server's text encoding.

use super::error::Result;
use super::value::DatabaseResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Core database trait that all database backends must implement
#[async_trait]
pub trait Database: Send + Sync {
    /// Connect to the database with the given connection string
    ///
    /// # Thread Safety
    /// This method uses interior mutability so it's safe to call from multiple
    /// threads concurrently, though only one connection operation will proceed at a time.
    async fn connect(&self, connection_string: &str) -> Result<()>;

    /// Check if connected to the database
    fn is_connected(&self) -> bool;

    /// Disconnect from the database
    async fn disconnect(&self) -> Result<()>;

    /// Execute a statement and return the number of rows it affected
    ///
    /// # Security Warning
    ///
    /// The statement is sent as-is. The mapping engine only ever passes text built
    /// with quoted identifiers and literals (see [`crate::core::sql`]).
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Execute a query and return its rows as text cells
    async fn query(&self, query: &str) -> Result<DatabaseResult>;

    /// Begin a transaction
    ///
    /// # Thread Safety
    /// Safe to call concurrently. Only one transaction can be active at a time per connection.
    async fn begin_transaction(&self) -> Result<()>;

    /// Commit the current transaction
    async fn commit(&self) -> Result<()>;

    /// Rollback the current transaction
    async fn rollback(&self) -> Result<()>;

    /// Check if currently in a transaction
    fn in_transaction(&self) -> bool;

    /// Execute multiple operations in a transaction
    ///
    /// # Note
    /// The generic parameters make `Database` unusable as a trait object; use
    /// [`DatabaseObject`] for dynamic dispatch.
    async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(
                &'a Self,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = Result<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        self.begin_transaction().await?;

        match f(self).await {
            Ok(result) => {
                self.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed transaction body failed");
                }
                Err(e)
            }
        }
    }
}

/// Object-safe version of the Database trait
///
/// The mapping engine and the codec take `&dyn DatabaseObject`, so any
/// [`Database`] implementation can be passed to them directly.
///
/// # Example
/// ```ignore
/// let db = PostgresDatabase::new();
/// let conn: &dyn DatabaseObject = &db;
/// Fruit::create_table(conn, TableOptions::default()).await?;
/// ```
#[async_trait]
pub trait DatabaseObject: Send + Sync {
    /// Connect to the database with the given connection string
    async fn connect(&self, connection_string: &str) -> Result<()>;

    /// Check if connected to the database
    fn is_connected(&self) -> bool;

    /// Disconnect from the database
    async fn disconnect(&self) -> Result<()>;

    /// Execute a statement and return the number of rows it affected
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Execute a query and return its rows as text cells
    async fn query(&self, query: &str) -> Result<DatabaseResult>;

    /// Begin a transaction
    async fn begin_transaction(&self) -> Result<()>;

    /// Commit the current transaction
    async fn commit(&self) -> Result<()>;

    /// Rollback the current transaction
    async fn rollback(&self) -> Result<()>;

    /// Check if currently in a transaction
    fn in_transaction(&self) -> bool;
}

/// Blanket implementation of DatabaseObject for all types implementing Database
#[async_trait]
impl<T: Database> DatabaseObject for T {
    async fn connect(&self, connection_string: &str) -> Result<()> {
        Database::connect(self, connection_string).await
    }

    fn is_connected(&self) -> bool {
        Database::is_connected(self)
    }

    async fn disconnect(&self) -> Result<()> {
        Database::disconnect(self).await
    }

    async fn execute(&self, query: &str) -> Result<u64> {
        Database::execute(self, query).await
    }

    async fn query(&self, query: &str) -> Result<DatabaseResult> {
        Database::query(self, query).await
    }

    async fn begin_transaction(&self) -> Result<()> {
        Database::begin_transaction(self).await
    }

    async fn commit(&self) -> Result<()> {
        Database::commit(self).await
    }

    async fn rollback(&self) -> Result<()> {
        Database::rollback(self).await
    }

    fn in_transaction(&self) -> bool {
        Database::in_transaction(self)
    }
}

/// Default PostgreSQL host
pub const DEFAULT_HOST: &str = "localhost";

/// Default PostgreSQL port
pub const DEFAULT_PORT: u16 = 5432;

/// PostgreSQL connection builder
///
/// Produces a libpq-style `key=value` connection string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionBuilder {
    host: String,
    port: u16,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    #[serde(default)]
    options: BTreeMap<String, String>,
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionBuilder {
    /// Create a new connection builder pointing at `localhost:5432`
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: None,
            username: None,
            password: None,
            options: BTreeMap::new(),
        }
    }

    /// Create a builder from the standard libpq environment variables
    ///
    /// Reads `PGHOST`, `PGPORT`, `PGDATABASE`, `PGUSER` and `PGPASSWORD`. Unset
    /// variables keep the defaults; an unparsable `PGPORT` is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();
        if let Some(host) = lookup("PGHOST") {
            builder = builder.host(host);
        }
        if let Some(port) = lookup("PGPORT") {
            let port = port.parse::<u16>().map_err(|_| {
                super::DatabaseError::InvalidConnectionString(format!("PGPORT={}", port))
            })?;
            builder = builder.port(port);
        }
        if let Some(database) = lookup("PGDATABASE") {
            builder = builder.database(database);
        }
        if let Some(username) = lookup("PGUSER") {
            builder = builder.username(username);
        }
        if let Some(password) = lookup("PGPASSWORD") {
            builder = builder.password(password);
        }
        Ok(builder)
    }

    /// Set the database host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// Set the database port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the username
    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Add a custom option
    pub fn option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Build the connection string
    pub fn build_connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote_param(&self.host)),
            format!("port={}", self.port),
        ];
        if let Some(database) = &self.database {
            parts.push(format!("dbname={}", quote_param(database)));
        }
        if let Some(username) = &self.username {
            parts.push(format!("user={}", quote_param(username)));
        }
        if let Some(password) = &self.password {
            parts.push(format!("password={}", quote_param(password)));
        }
        for (key, value) in &self.options {
            parts.push(format!("{}={}", key, quote_param(value)));
        }
        parts.join(" ")
    }
}

/// Quote a connection parameter value when it contains spaces, quotes or backslashes
fn quote_param(value: &str) -> String {
    if !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\')
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
