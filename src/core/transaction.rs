//! Transaction guard for automatic rollback on drop
//!
//! This module provides RAII-style transaction management with automatic rollback.

use super::database::Database;
use super::error::{DatabaseError, Result};
use super::value::DatabaseResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Transaction guard that automatically rolls back on drop if not committed
///
/// Mapping operations run inside the guard through [`TransactionGuard::database`]:
///
/// ```ignore
/// use rust_database_models::prelude::*;
///
/// async fn save(db: Arc<PostgresDatabase>, basket: &mut FruitBasket) -> Result<()> {
///     let tx = TransactionGuard::begin(db).await?;
///
///     basket.insert_or_update(tx.database()).await?;
///
///     tx.commit().await?;
///     Ok(())
/// }
/// ```
pub struct TransactionGuard<D: Database + 'static> {
    db: Arc<D>,
    committed: AtomicBool,
    rolled_back: AtomicBool,
}

impl<D: Database + 'static> TransactionGuard<D> {
    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database is not connected
    /// - A transaction is already active
    /// - Database operation fails
    pub async fn begin(db: Arc<D>) -> Result<Self> {
        db.begin_transaction().await?;

        Ok(Self {
            db,
            committed: AtomicBool::new(false),
            rolled_back: AtomicBool::new(false),
        })
    }

    fn ensure_active(&self, action: &str) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(format!(
                "Cannot {} on committed transaction",
                action
            )));
        }
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(format!(
                "Cannot {} on rolled back transaction",
                action
            )));
        }
        Ok(())
    }

    /// The connection the transaction runs on
    pub fn database(&self) -> &D {
        &self.db
    }

    /// Execute a statement within the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is finished or the statement fails
    pub async fn execute(&self, query: &str) -> Result<u64> {
        self.ensure_active("execute")?;
        self.db.execute(query).await
    }

    /// Query within the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is finished or the query fails
    pub async fn query(&self, query: &str) -> Result<DatabaseResult> {
        self.ensure_active("query")?;
        self.db.query(query).await
    }

    /// Commit the transaction
    ///
    /// After calling this method, the transaction is complete and the guard
    /// will not perform automatic rollback on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails
    pub async fn commit(self) -> Result<()> {
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "Cannot commit a rolled back transaction",
            ));
        }

        self.db.commit().await?;
        self.committed.store(true, Ordering::Release);

        Ok(())
    }

    /// Explicitly rollback the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails
    pub async fn rollback(self) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "Cannot rollback a committed transaction",
            ));
        }

        self.db.rollback().await?;
        self.rolled_back.store(true, Ordering::Release);

        Ok(())
    }

    /// Check if the transaction has been committed
    pub fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    /// Check if the transaction has been rolled back
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back.load(Ordering::Acquire)
    }
}

impl<D: Database + 'static> Drop for TransactionGuard<D> {
    fn drop(&mut self) {
        if self.committed.load(Ordering::Acquire) || self.rolled_back.load(Ordering::Acquire) {
            return;
        }

        let db = Arc::clone(&self.db);
        self.rolled_back.store(true, Ordering::Release);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = db.rollback().await {
                        tracing::error!(error = %e, "transaction auto-rollback failed");
                    }
                });
                tracing::warn!("transaction guard dropped without commit or rollback; rollback queued");
            }
            Err(_) => {
                tracing::warn!(
                    "transaction guard dropped outside a tokio runtime; \
                     the server rolls back when the connection closes"
                );
            }
        }
    }
}
