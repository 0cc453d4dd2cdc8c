//! SQL text helpers
//!
//! Identifiers are always rendered double-quoted and literals single-quoted, with
//! embedded quote characters doubled.

/// Quote an identifier (`name` → `"name"`)
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema-qualified table reference (`"schema"."table"`)
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(schema), quote_identifier(table))
}

/// Render wire text as a SQL literal; `None` becomes `NULL`
pub fn literal(text: Option<&str>) -> String {
    match text {
        Some(text) => format!("'{}'", text.replace('\'', "''")),
        None => "NULL".to_string(),
    }
}

/// Comma-separated list of quoted identifiers
pub fn identifier_list<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(", ")
}
