//! Database backend implementations
//!
//! This module contains concrete implementations of the Database trait.

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
