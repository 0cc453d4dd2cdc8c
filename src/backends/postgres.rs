//! PostgreSQL database backend implementation
//!
//! This module provides a PostgreSQL implementation of the Database trait using
//! tokio-postgres. Statements go through the simple query protocol, so every cell
//! arrives in the server's text encoding, ready for the value codec.

use crate::core::{
    database::Database, error::DatabaseError, error::Result, value::DatabaseResult,
    value::DatabaseRow,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, SimpleQueryRow};

/// Default timeout for database operations (30 seconds)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL database implementation
pub struct PostgresDatabase {
    client: Arc<Mutex<Option<Client>>>,
    in_transaction: Arc<Mutex<bool>>,
}

impl PostgresDatabase {
    /// Create a new PostgreSQL database instance
    pub fn new() -> Self {
        Self {
            client: Arc::new(Mutex::new(None)),
            in_transaction: Arc::new(Mutex::new(false)),
        }
    }

    /// Convert a simple-query row to a DatabaseRow
    fn row_to_database_row(row: &SimpleQueryRow) -> DatabaseRow {
        let columns = row
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect();
        let cells = (0..row.len())
            .map(|idx| row.get(idx).map(str::to_string))
            .collect();
        DatabaseRow::new(columns, cells)
    }

    /// Run one statement with the operation timeout
    async fn simple_query(&self, query: &str) -> Result<Vec<SimpleQueryMessage>> {
        let client = self.client.lock().await;
        let client = client
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        tokio::time::timeout(DEFAULT_OPERATION_TIMEOUT, client.simple_query(query))
            .await
            .map_err(|_| {
                DatabaseError::query_timeout(DEFAULT_OPERATION_TIMEOUT.as_millis() as u64)
            })?
            .map_err(|e| DatabaseError::query(e.to_string()))
    }

    /// Run a transaction control statement
    async fn control(&self, statement: &str) -> Result<()> {
        let client = self.client.lock().await;
        let client = client
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        tokio::time::timeout(DEFAULT_OPERATION_TIMEOUT, client.batch_execute(statement))
            .await
            .map_err(|_| {
                DatabaseError::query_timeout(DEFAULT_OPERATION_TIMEOUT.as_millis() as u64)
            })?
            .map_err(|e| DatabaseError::transaction(e.to_string()))
    }
}

impl Default for PostgresDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn connect(&self, connection_string: &str) -> Result<()> {
        // Clean up any existing connection first
        {
            let mut client = self.client.lock().await;
            *client = None;
        }

        {
            let mut in_transaction = self.in_transaction.lock().await;
            *in_transaction = false;
        }

        let connection_string = connection_string.to_string();
        let client_arc = Arc::clone(&self.client);

        let connect_future = async move {
            let (client, connection) = tokio_postgres::connect(&connection_string, NoTls)
                .await
                .map_err(|e| DatabaseError::connection(e.to_string()))?;

            // The connection object drives the socket until the client is dropped
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });

            let mut client_guard = client_arc.lock().await;
            *client_guard = Some(client);

            Ok::<(), DatabaseError>(())
        };

        tokio::time::timeout(DEFAULT_OPERATION_TIMEOUT, connect_future)
            .await
            .map_err(|_| {
                DatabaseError::connection_timeout(DEFAULT_OPERATION_TIMEOUT.as_millis() as u64)
            })??;

        tracing::debug!("connected to PostgreSQL");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client
            .try_lock()
            .map(|client| {
                if let Some(ref c) = *client {
                    !c.is_closed()
                } else {
                    false
                }
            })
            .unwrap_or(false)
    }

    async fn disconnect(&self) -> Result<()> {
        {
            let mut in_transaction = self.in_transaction.lock().await;
            *in_transaction = false;
        }

        let mut client = self.client.lock().await;
        *client = None;
        Ok(())
    }

    async fn execute(&self, query: &str) -> Result<u64> {
        let messages = self.simple_query(query).await?;
        let affected: u64 = messages
            .iter()
            .map(|message| match message {
                SimpleQueryMessage::CommandComplete(count) => *count,
                _ => 0,
            })
            .sum();
        Ok(affected)
    }

    async fn query(&self, query: &str) -> Result<DatabaseResult> {
        let messages = self.simple_query(query).await?;
        let results: DatabaseResult = messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(Self::row_to_database_row(row)),
                _ => None,
            })
            .collect();
        Ok(results)
    }

    async fn begin_transaction(&self) -> Result<()> {
        let mut in_transaction = self.in_transaction.lock().await;

        if *in_transaction {
            return Err(DatabaseError::transaction("Already in a transaction"));
        }

        self.control("BEGIN").await?;
        *in_transaction = true;

        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut in_transaction = self.in_transaction.lock().await;

        if !*in_transaction {
            return Err(DatabaseError::transaction("Not in a transaction"));
        }

        self.control("COMMIT").await?;
        *in_transaction = false;

        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut in_transaction = self.in_transaction.lock().await;

        if !*in_transaction {
            return Err(DatabaseError::transaction("Not in a transaction"));
        }

        self.control("ROLLBACK").await?;
        *in_transaction = false;

        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
            .try_lock()
            .map(|guard| *guard)
            .unwrap_or(false)
    }
}
