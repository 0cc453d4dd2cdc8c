//! Nested array and composite text grammar
//!
//! Arrays use the `{a,"b c",NULL,{1,2}}` form: quoted elements escape with `\`,
//! an unquoted `NULL` is a null element and nested sub-arrays are returned as raw
//! text for the element codec to split again. Composites use the `(1,"a b",,"x""y")`
//! form: an empty unquoted field is null, `""` is the empty string and quoted
//! fields escape with either `""` or `\`.

use crate::core::{DatabaseError, Result};
use std::iter::Peekable;
use std::str::Chars;

fn array_error(raw: &str, message: impl Into<String>) -> DatabaseError {
    DatabaseError::decode("array", raw, message)
}

fn composite_error(raw: &str, message: impl Into<String>) -> DatabaseError {
    DatabaseError::decode("composite", raw, message)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
}

/// Strip an optional `[lower:upper]...=` dimension prefix
fn strip_bounds(text: &str) -> &str {
    if text.starts_with('[') {
        if let Some(idx) = text.find('=') {
            return text[idx + 1..].trim_start();
        }
    }
    text
}

/// Split array text into its top-level element texts
///
/// Sub-arrays are returned verbatim (braces included).
pub fn split_array(raw: &str) -> Result<Vec<Option<String>>> {
    let text = strip_bounds(raw.trim());
    let inner = text
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| array_error(raw, "expected text enclosed in '{' and '}'"))?;

    let mut items = Vec::new();
    if inner.trim().is_empty() {
        return Ok(items);
    }

    let mut chars = inner.chars().peekable();
    loop {
        skip_whitespace(&mut chars);
        match chars.peek() {
            Some('"') => {
                chars.next();
                items.push(Some(read_quoted_element(&mut chars, raw)?));
            }
            Some('{') => items.push(Some(read_sub_array(&mut chars, raw)?)),
            _ => {
                let mut token = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    token.push(c);
                    chars.next();
                }
                let token = token.trim_end();
                if token.eq_ignore_ascii_case("NULL") {
                    items.push(None);
                } else {
                    items.push(Some(token.to_string()));
                }
            }
        }

        skip_whitespace(&mut chars);
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(c) => {
                return Err(array_error(
                    raw,
                    format!("unexpected {:?} after element", c),
                ))
            }
        }
    }

    Ok(items)
}

fn read_quoted_element(chars: &mut Peekable<Chars<'_>>, raw: &str) -> Result<String> {
    let mut buf = String::new();
    loop {
        match chars.next() {
            Some('\\') => match chars.next() {
                Some(c) => buf.push(c),
                None => return Err(array_error(raw, "dangling escape")),
            },
            Some('"') => return Ok(buf),
            Some(c) => buf.push(c),
            None => return Err(array_error(raw, "unterminated quoted element")),
        }
    }
}

fn read_sub_array(chars: &mut Peekable<Chars<'_>>, raw: &str) -> Result<String> {
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        buf.push(c);
        if in_quotes {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        buf.push(next);
                    }
                }
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(buf);
                }
            }
            _ => {}
        }
    }

    Err(array_error(raw, "unbalanced braces in nested array"))
}

/// Split composite text into its field texts
pub fn split_composite(raw: &str) -> Result<Vec<Option<String>>> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| composite_error(raw, "expected text enclosed in '(' and ')'"))?;

    let mut fields = Vec::new();
    let mut buf = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = inner.chars().peekable();

    let finish = |buf: &mut String, quoted: &mut bool| {
        let field = if buf.is_empty() && !*quoted {
            None
        } else {
            Some(std::mem::take(buf))
        };
        *quoted = false;
        field
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    buf.push('"');
                }
                '"' => in_quotes = false,
                '\\' => match chars.next() {
                    Some(next) => buf.push(next),
                    None => return Err(composite_error(raw, "dangling escape")),
                },
                _ => buf.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                quoted = true;
            }
            // Brackets outside quotes are plain text; nested values holding
            // a comma always arrive quoted.
            ',' => fields.push(finish(&mut buf, &mut quoted)),
            _ => buf.push(c),
        }
    }

    if in_quotes {
        return Err(composite_error(raw, "unterminated quoted field"));
    }
    fields.push(finish(&mut buf, &mut quoted));

    Ok(fields)
}

/// Quote an array element when the grammar requires it
pub fn quote_array_element(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text.eq_ignore_ascii_case("NULL")
        || text
            .chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Quote a composite field the way the server's record output does
///
/// Braces stay bare, so `{x` is emitted unquoted.
pub fn quote_composite_field(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text
            .chars()
            .any(|c| matches!(c, '(' | ')' | ',' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push(c);
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Join element texts into array text
///
/// With `nested` set, elements are sub-array texts and are emitted verbatim.
pub fn format_array(items: &[Option<String>], nested: bool) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            None => "NULL".to_string(),
            Some(text) if nested => text.clone(),
            Some(text) => quote_array_element(text),
        })
        .collect();
    format!("{{{}}}", parts.join(","))
}

/// Join field texts into composite text; `None` fields are left empty
pub fn format_composite(fields: &[Option<String>]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|field| match field {
            None => String::new(),
            Some(text) => quote_composite_field(text),
        })
        .collect();
    format!("({})", parts.join(","))
}
