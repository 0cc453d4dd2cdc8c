//! Named columns

use super::column_type::ColumnType;
use crate::core::sql::quote_identifier;
use lazy_static::lazy_static;
use regex::Regex;

/// Reserved for the connection handle on persisted objects
const RESERVED_NAME: &str = "conn";

lazy_static! {
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,58}$").expect("identifier pattern is valid");
}

/// One column of a record type or one field of a composite
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    auto_filled: bool,
}

impl Column {
    /// Create a column whose value the caller supplies
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            auto_filled: false,
        }
    }

    /// Mark the column as filled by the server on insert
    #[must_use]
    pub fn auto_filled(mut self) -> Self {
        self.auto_filled = true;
        self
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column type
    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    /// Whether the server fills this column on insert
    pub fn is_auto_filled(&self) -> bool {
        self.auto_filled
    }

    /// Whether this is the primary key column
    pub fn is_primary(&self) -> bool {
        self.column_type.is_primary()
    }

    /// `"name" TYPE ...` as used in CREATE TABLE
    pub fn definition(&self) -> String {
        format!(
            "{} {}",
            quote_identifier(&self.name),
            self.column_type.type_statement()
        )
    }

    pub(crate) fn validate_name(&self) -> std::result::Result<(), String> {
        if self.name == RESERVED_NAME {
            return Err(format!("column name {:?} is reserved", RESERVED_NAME));
        }
        if IDENTIFIER.is_match(&self.name) {
            Ok(())
        } else {
            Err(format!("{:?} is not a valid column name", self.name))
        }
    }
}
