//! Filter fragments for record fetches
//!
//! Builds the `WHERE ... ORDER BY ... LIMIT ... OFFSET ...` tail appended after the
//! table reference of a fetch. Columns are quoted as identifiers and values are
//! rendered as literals from their wire text. Anything the builder cannot express
//! (`OR`, `IN`, subqueries) goes in a raw fragment emitted verbatim.

use super::sql::{literal, quote_identifier};
use super::value::Value;
use std::fmt;

/// SQL comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal to (=)
    Eq,
    /// Not equal to (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// LIKE pattern matching
    Like,
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
}

impl Operator {
    fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }
}

/// WHERE clause condition
#[derive(Debug, Clone)]
struct Condition {
    column: String,
    operator: Operator,
    value: Option<Value>,
}

impl Condition {
    fn render(&self) -> String {
        let column = quote_identifier(&self.column);
        match (&self.operator, &self.value) {
            (Operator::IsNull | Operator::IsNotNull, _) | (_, None) => {
                format!("{} {}", column, self.operator.as_sql())
            }
            (operator, Some(value)) => match value.to_text() {
                Some(text) => format!("{} {} {}", column, operator.as_sql(), literal(Some(&text))),
                None if *operator == Operator::Ne => format!("{} IS NOT NULL", column),
                None => format!("{} IS NULL", column),
            },
        }
    }
}

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order
    Asc,
    /// Descending order
    Desc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Filter/ordering fragment builder
///
/// # Example
///
/// ```
/// use rust_database_models::core::filter::Filter;
///
/// let filter = Filter::new().where_eq("name", "apple").order_by_asc("id").limit(10);
/// assert_eq!(
///     filter.build(),
///     "WHERE \"name\" = 'apple' ORDER BY \"id\" ASC LIMIT 10"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filter {
    raw: Option<String>,
    conditions: Vec<Condition>,
    order_by: Vec<(String, OrderDirection)>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl Filter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-written fragment, emitted as is
    ///
    /// Builder clauses added afterwards render after it, so a fragment combined
    /// with `where_*` should not carry its own WHERE.
    ///
    /// ```
    /// use rust_database_models::core::filter::Filter;
    ///
    /// let filter = Filter::raw("WHERE \"name\" IN ('fig', 'plum') OR \"id\" > 10").limit(5);
    /// assert_eq!(filter.build(), "WHERE \"name\" IN ('fig', 'plum') OR \"id\" > 10 LIMIT 5");
    /// ```
    pub fn raw(fragment: impl Into<String>) -> Self {
        Self {
            raw: Some(fragment.into()),
            ..Self::default()
        }
    }

    fn condition(mut self, column: &str, operator: Operator, value: Option<Value>) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            operator,
            value,
        });
        self
    }

    /// Add a WHERE column = value condition (a null value renders `IS NULL`)
    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.condition(column, Operator::Eq, Some(value.into()))
    }

    /// Add a WHERE column <> value condition
    #[must_use]
    pub fn where_ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.condition(column, Operator::Ne, Some(value.into()))
    }

    /// Add a WHERE column > value condition
    #[must_use]
    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.condition(column, Operator::Gt, Some(value.into()))
    }

    /// Add a WHERE column >= value condition
    #[must_use]
    pub fn where_ge(self, column: &str, value: impl Into<Value>) -> Self {
        self.condition(column, Operator::Ge, Some(value.into()))
    }

    /// Add a WHERE column < value condition
    #[must_use]
    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.condition(column, Operator::Lt, Some(value.into()))
    }

    /// Add a WHERE column <= value condition
    #[must_use]
    pub fn where_le(self, column: &str, value: impl Into<Value>) -> Self {
        self.condition(column, Operator::Le, Some(value.into()))
    }

    /// Add a WHERE column LIKE pattern condition
    #[must_use]
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.condition(column, Operator::Like, Some(Value::from(pattern)))
    }

    /// Add a WHERE column IS NULL condition
    #[must_use]
    pub fn where_null(self, column: &str) -> Self {
        self.condition(column, Operator::IsNull, None)
    }

    /// Add a WHERE column IS NOT NULL condition
    #[must_use]
    pub fn where_not_null(self, column: &str) -> Self {
        self.condition(column, Operator::IsNotNull, None)
    }

    /// Add ORDER BY clause
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    /// Add ORDER BY ASC
    #[must_use]
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Asc)
    }

    /// Add ORDER BY DESC
    #[must_use]
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Add LIMIT clause
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add OFFSET clause
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Check if the filter renders to an empty fragment
    pub fn is_empty(&self) -> bool {
        self.raw.as_deref().map_or(true, str::is_empty)
            && self.conditions.is_empty()
            && self.order_by.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
    }

    /// Build the fragment (empty string for an empty filter)
    pub fn build(&self) -> String {
        let mut parts = Vec::new();

        if let Some(raw) = self.raw.as_deref().filter(|raw| !raw.is_empty()) {
            parts.push(raw.to_string());
        }

        if !self.conditions.is_empty() {
            let conditions: Vec<String> = self.conditions.iter().map(Condition::render).collect();
            parts.push(format!("WHERE {}", conditions.join(" AND ")));
        }

        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(col, dir)| format!("{} {}", quote_identifier(col), dir.as_sql()))
                .collect();
            parts.push(format!("ORDER BY {}", order_clauses.join(", ")));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {}", offset));
        }

        parts.join(" ")
    }
}

impl From<&str> for Filter {
    fn from(fragment: &str) -> Self {
        Filter::raw(fragment)
    }
}

impl From<String> for Filter {
    fn from(fragment: String) -> Self {
        Filter::raw(fragment)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}
