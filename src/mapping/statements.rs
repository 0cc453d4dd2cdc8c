//! SQL text for the mapping engine
//!
//! Pure builders: identifiers are quoted and values arrive as wire text to be
//! rendered as literals.

use crate::core::sql::{identifier_list, literal, quote_identifier};
use crate::core::Filter;
use crate::schema::RecordSchema;

/// `CREATE SCHEMA IF NOT EXISTS "schema"`
pub fn create_schema(schema: &RecordSchema) -> String {
    format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        quote_identifier(schema.schema_name())
    )
}

/// `DROP SCHEMA IF EXISTS "schema" CASCADE`
pub fn drop_schema(schema: &RecordSchema) -> String {
    format!(
        "DROP SCHEMA IF EXISTS {} CASCADE",
        quote_identifier(schema.schema_name())
    )
}

/// `DROP TABLE IF EXISTS "schema"."table" CASCADE`
pub fn drop_table(schema: &RecordSchema) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", schema.qualified_table())
}

/// `CREATE TABLE IF NOT EXISTS` with one definition per column
pub fn create_table(schema: &RecordSchema) -> String {
    let definitions: Vec<String> = schema.columns().iter().map(|c| c.definition()).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.qualified_table(),
        definitions.join(", ")
    )
}

fn all_columns(schema: &RecordSchema) -> String {
    identifier_list(schema.columns().iter().map(|c| c.name()))
}

/// `SELECT (...) FROM "schema"."table"` plus the filter, if any
pub fn select(schema: &RecordSchema, filter: &Filter) -> String {
    let mut sql = format!(
        "SELECT ({}) FROM {}",
        all_columns(schema),
        schema.qualified_table()
    );
    if !filter.is_empty() {
        sql.push(' ');
        sql.push_str(&filter.build());
    }
    sql
}

/// INSERT returning every column; `DEFAULT VALUES` when nothing is supplied
pub fn insert(schema: &RecordSchema, assignments: &[(&str, Option<String>)]) -> String {
    let returning = all_columns(schema);
    if assignments.is_empty() {
        return format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING ({})",
            schema.qualified_table(),
            returning
        );
    }

    let columns = identifier_list(assignments.iter().map(|(name, _)| *name));
    let values: Vec<String> = assignments
        .iter()
        .map(|(_, text)| literal(text.as_deref()))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING ({})",
        schema.qualified_table(),
        columns,
        values.join(", "),
        returning
    )
}

/// UPDATE of the given columns keyed by `key_column = key`
pub fn update(
    schema: &RecordSchema,
    assignments: &[(&str, Option<String>)],
    key_column: &str,
    key: &str,
) -> String {
    let values: Vec<String> = assignments
        .iter()
        .map(|(_, text)| literal(text.as_deref()))
        .collect();
    // A parenthesized target list needs at least two columns.
    let set = if assignments.len() == 1 {
        format!("{} = {}", quote_identifier(assignments[0].0), values[0])
    } else {
        format!(
            "({}) = ({})",
            identifier_list(assignments.iter().map(|(name, _)| *name)),
            values.join(", ")
        )
    };
    format!(
        "UPDATE {} SET {} WHERE {} = {}",
        schema.qualified_table(),
        set,
        quote_identifier(key_column),
        literal(Some(key))
    )
}

/// DELETE keyed by `key_column = key`
pub fn delete(schema: &RecordSchema, key_column: &str, key: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = {}",
        schema.qualified_table(),
        quote_identifier(key_column),
        literal(Some(key))
    )
}
