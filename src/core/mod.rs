//! Core types and traits
//!
//! This module provides the building blocks shared by the rest of the crate:
//! error types, host values and textual rows, the database trait, connection
//! configuration, transactions, filter fragments and SQL quoting.

pub mod database;
pub mod error;
pub mod filter;
pub mod sql;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use database::{ConnectionBuilder, Database, DatabaseObject};
pub use error::{DatabaseError, Result};
pub use filter::{Filter, OrderDirection};
pub use transaction::TransactionGuard;
pub use value::{DatabaseResult, DatabaseRow, FromValue, Value};
