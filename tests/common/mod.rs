//! Shared helpers for integration tests
//!
//! `FakePostgres` is an in-process stand-in for a PostgreSQL server. It understands
//! exactly the statement shapes the mapping engine emits, keeps rows as wire text,
//! enforces NOT NULL, primary key and foreign key constraints and answers record
//! selects with composite row text, like the real server does.

#![allow(dead_code)]

pub mod models;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_database_models::codec::parser::format_composite;
use rust_database_models::{Database, DatabaseError, DatabaseResult, DatabaseRow, Result};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

type TableKey = (String, String);

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Word(String),
    Punct(char),
}

fn syntax(sql: &str, message: &str) -> DatabaseError {
    DatabaseError::query(format!("syntax error ({}) in: {}", message, sql))
}

fn tokenize(sql: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some(q) if q == c => {
                        if chars.peek() == Some(&c) {
                            chars.next();
                            text.push(c);
                        } else {
                            break;
                        }
                    }
                    Some(other) => text.push(other),
                    None => return Err(syntax(sql, "unterminated quote")),
                }
            }
            tokens.push(if c == '"' {
                Token::Ident(text)
            } else {
                Token::Str(text)
            });
        } else if c.is_alphanumeric() || c == '_' || c == '-' {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' || c == '-' {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Word(word.to_ascii_uppercase()));
        } else {
            tokens.push(Token::Punct(c));
            chars.next();
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    sql: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(sql: &'a str) -> Result<Self> {
        Ok(Self {
            sql,
            tokens: tokenize(sql)?,
            pos: 0,
        })
    }

    fn error(&self, message: &str) -> DatabaseError {
        syntax(self.sql, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_word(&mut self, keyword: &str) -> bool {
        if self.peek() == Some(&Token::Word(keyword.to_string())) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, keyword: &str) -> Result<()> {
        if self.eat_word(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", keyword)))
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(self.error("expected quoted identifier")),
        }
    }

    fn literal(&mut self) -> Result<Option<String>> {
        match self.next() {
            Some(Token::Str(text)) => Ok(Some(text)),
            Some(Token::Word(word)) if word == "NULL" => Ok(None),
            _ => Err(self.error("expected literal")),
        }
    }

    fn number(&mut self) -> Result<usize> {
        match self.next() {
            Some(Token::Word(word)) => word.parse().map_err(|_| self.error("expected number")),
            _ => Err(self.error("expected number")),
        }
    }

    fn table_ref(&mut self) -> Result<TableKey> {
        let schema = self.ident()?;
        self.expect_punct('.')?;
        Ok((schema, self.ident()?))
    }

    fn ident_list(&mut self) -> Result<Vec<String>> {
        self.expect_punct('(')?;
        let mut names = vec![self.ident()?];
        while self.eat_punct(',') {
            names.push(self.ident()?);
        }
        self.expect_punct(')')?;
        Ok(names)
    }

    fn literal_list(&mut self) -> Result<Vec<Option<String>>> {
        self.expect_punct('(')?;
        let mut values = vec![self.literal()?];
        while self.eat_punct(',') {
            values.push(self.literal()?);
        }
        self.expect_punct(')')?;
        Ok(values)
    }

    /// `"c" = 'v'`, `"c" IN ('a', 'b')`, `"c" IS NULL` or `"c" IS NOT NULL`
    fn condition(&mut self) -> Result<(String, Condition)> {
        let column = self.ident()?;
        if self.eat_punct('=') {
            return Ok((column, Condition::Equals(self.literal()?)));
        }
        if self.eat_word("IN") {
            return Ok((column, Condition::In(self.literal_list()?)));
        }
        self.expect_word("IS")?;
        let negated = self.eat_word("NOT");
        self.expect_word("NULL")?;
        Ok((column, Condition::Null { negated }))
    }

    fn conjunction(&mut self) -> Result<Vec<(String, Condition)>> {
        let mut conditions = vec![self.condition()?];
        while self.eat_word("AND") {
            conditions.push(self.condition()?);
        }
        Ok(conditions)
    }

    /// OR-joined groups of AND-joined conditions; empty without WHERE
    fn where_clause(&mut self) -> Result<Vec<Vec<(String, Condition)>>> {
        let mut groups = Vec::new();
        if self.eat_word("WHERE") {
            groups.push(self.conjunction()?);
            while self.eat_word("OR") {
                groups.push(self.conjunction()?);
            }
        }
        Ok(groups)
    }

    /// Tokens up to the parenthesis closing the one just consumed
    fn parenthesized(&mut self) -> Result<Vec<Token>> {
        let mut depth = 1usize;
        let mut inner = Vec::new();
        loop {
            match self.next() {
                Some(Token::Punct('(')) => {
                    depth += 1;
                    inner.push(Token::Punct('('));
                }
                Some(Token::Punct(')')) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(inner);
                    }
                    inner.push(Token::Punct(')'));
                }
                Some(token) => inner.push(token),
                None => return Err(self.error("unbalanced parentheses")),
            }
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing tokens"))
        }
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Equals(Option<String>),
    In(Vec<Option<String>>),
    Null { negated: bool },
}

impl Condition {
    fn matches(&self, cell: &Option<String>) -> bool {
        match self {
            // `= NULL` is never true in SQL
            Condition::Equals(expected) => expected.is_some() && cell == expected,
            Condition::In(options) => cell.is_some() && options.contains(cell),
            Condition::Null { negated } => cell.is_none() != *negated,
        }
    }
}

#[derive(Debug, Clone)]
struct TableColumn {
    name: String,
    serial: bool,
    not_null: bool,
    references: Option<(TableKey, String)>,
}

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<TableColumn>,
    primary_key: Option<usize>,
    rows: Vec<Vec<Option<String>>>,
    next_serial: i64,
}

impl Table {
    fn index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| DatabaseError::query(format!("column \"{}\" does not exist", column)))
    }

    fn matching(&self, groups: &[Vec<(String, Condition)>]) -> Result<Vec<usize>> {
        let resolved = groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|(column, condition)| Ok((self.index(column)?, condition)))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.rows.len())
            .filter(|&row| {
                resolved.is_empty()
                    || resolved.iter().any(|group| {
                        group
                            .iter()
                            .all(|(idx, condition)| condition.matches(&self.rows[row][*idx]))
                    })
            })
            .collect())
    }
}

fn parse_column(tokens: &[Token], sql: &str) -> Result<(TableColumn, bool)> {
    let name = match tokens.first() {
        Some(Token::Ident(name)) => name.clone(),
        _ => return Err(syntax(sql, "column definition needs a name")),
    };
    let words = |a: &str, b: &str| {
        tokens
            .windows(2)
            .any(|w| w[0] == Token::Word(a.to_string()) && w[1] == Token::Word(b.to_string()))
    };
    let primary = words("PRIMARY", "KEY");
    let references = match tokens
        .iter()
        .position(|t| *t == Token::Word("REFERENCES".to_string()))
    {
        Some(at) => match &tokens[at + 1..] {
            [Token::Ident(schema), Token::Punct('.'), Token::Ident(table), Token::Punct('('), Token::Ident(column), Token::Punct(')'), ..] => {
                Some(((schema.clone(), table.clone()), column.clone()))
            }
            _ => return Err(syntax(sql, "malformed REFERENCES")),
        },
        None => None,
    };
    let column = TableColumn {
        name,
        serial: tokens.get(1) == Some(&Token::Word("SERIAL".to_string())),
        not_null: primary || words("NOT", "NULL"),
        references,
    };
    Ok((column, primary))
}

fn compare_cells(a: &Option<String>, b: &Option<String>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Greater,
        (Some(_), None) => CmpOrdering::Less,
        (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal),
            _ => a.cmp(b),
        },
    }
}

enum Outcome {
    Count(u64),
    Rows(Vec<DatabaseRow>),
}

#[derive(Debug, Clone, Default)]
struct Store {
    schemas: BTreeSet<String>,
    tables: HashMap<TableKey, Table>,
}

impl Store {
    fn table(&self, key: &TableKey) -> Result<&Table> {
        self.tables
            .get(key)
            .ok_or_else(|| DatabaseError::query(format!("relation \"{}.{}\" does not exist", key.0, key.1)))
    }

    fn table_mut(&mut self, key: &TableKey) -> Result<&mut Table> {
        self.tables
            .get_mut(key)
            .ok_or_else(|| DatabaseError::query(format!("relation \"{}.{}\" does not exist", key.0, key.1)))
    }

    fn check_row(&self, key: &TableKey, row: &[Option<String>], skip: Option<usize>) -> Result<()> {
        let table = self.table(key)?;
        for (idx, column) in table.columns.iter().enumerate() {
            let cell = &row[idx];
            if column.not_null && cell.is_none() {
                return Err(DatabaseError::query(format!(
                    "null value in column \"{}\" violates not-null constraint",
                    column.name
                )));
            }
            if table.primary_key == Some(idx) {
                let duplicate = table
                    .rows
                    .iter()
                    .enumerate()
                    .any(|(other, existing)| Some(other) != skip && existing[idx] == *cell);
                if duplicate {
                    return Err(DatabaseError::query(format!(
                        "duplicate key value violates unique constraint on \"{}\"",
                        column.name
                    )));
                }
            }
            if let (Some((target, target_column)), Some(value)) = (&column.references, cell) {
                let target_table = self.table(target)?;
                let target_idx = target_table.index(target_column)?;
                if !target_table
                    .rows
                    .iter()
                    .any(|existing| existing[target_idx].as_deref() == Some(value.as_str()))
                {
                    return Err(DatabaseError::query(format!(
                        "insert or update on \"{}\" violates foreign key constraint on \"{}\"",
                        key.1, column.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn project(table: &Table, row: &[Option<String>], columns: &[String]) -> Result<DatabaseRow> {
        let cells = columns
            .iter()
            .map(|column| Ok(row[table.index(column)?].clone()))
            .collect::<Result<Vec<_>>>()?;
        if cells.len() == 1 {
            Ok(DatabaseRow::new(columns.to_vec(), cells))
        } else {
            Ok(DatabaseRow::new(
                vec!["row".to_string()],
                vec![Some(format_composite(&cells))],
            ))
        }
    }

    fn run(&mut self, sql: &str) -> Result<Outcome> {
        let mut p = Parser::new(sql)?;
        let outcome = match p.next() {
            Some(Token::Word(w)) if w == "CREATE" => self.create(&mut p)?,
            Some(Token::Word(w)) if w == "DROP" => self.drop(&mut p)?,
            Some(Token::Word(w)) if w == "SELECT" => self.select(&mut p)?,
            Some(Token::Word(w)) if w == "INSERT" => self.insert(&mut p)?,
            Some(Token::Word(w)) if w == "UPDATE" => self.update(&mut p)?,
            Some(Token::Word(w)) if w == "DELETE" => self.delete(&mut p)?,
            _ => return Err(p.error("unsupported statement")),
        };
        p.finish()?;
        Ok(outcome)
    }

    fn create(&mut self, p: &mut Parser<'_>) -> Result<Outcome> {
        if p.eat_word("SCHEMA") {
            p.expect_word("IF")?;
            p.expect_word("NOT")?;
            p.expect_word("EXISTS")?;
            self.schemas.insert(p.ident()?);
            return Ok(Outcome::Count(0));
        }

        p.expect_word("TABLE")?;
        p.expect_word("IF")?;
        p.expect_word("NOT")?;
        p.expect_word("EXISTS")?;
        let key = p.table_ref()?;
        p.expect_punct('(')?;
        let body = p.parenthesized()?;

        if !self.schemas.contains(&key.0) {
            return Err(DatabaseError::query(format!("schema \"{}\" does not exist", key.0)));
        }
        if self.tables.contains_key(&key) {
            return Ok(Outcome::Count(0));
        }

        let mut table = Table::default();
        let mut depth = 0usize;
        let mut definition = Vec::new();
        let mut definitions = Vec::new();
        for token in body {
            match token {
                Token::Punct(',') if depth == 0 => definitions.push(std::mem::take(&mut definition)),
                Token::Punct('(') => {
                    depth += 1;
                    definition.push(token);
                }
                Token::Punct(')') => {
                    depth = depth.saturating_sub(1);
                    definition.push(token);
                }
                other => definition.push(other),
            }
        }
        definitions.push(definition);

        for (idx, definition) in definitions.iter().enumerate() {
            let (column, primary) = parse_column(definition, p.sql)?;
            if let Some((target, _)) = &column.references {
                self.table(target)?;
            }
            if primary {
                if table.primary_key.is_some() {
                    return Err(DatabaseError::query("multiple primary keys are not allowed"));
                }
                table.primary_key = Some(idx);
            }
            table.columns.push(column);
        }
        self.tables.insert(key, table);
        Ok(Outcome::Count(0))
    }

    fn drop(&mut self, p: &mut Parser<'_>) -> Result<Outcome> {
        if p.eat_word("SCHEMA") {
            p.expect_word("IF")?;
            p.expect_word("EXISTS")?;
            let schema = p.ident()?;
            p.expect_word("CASCADE")?;
            self.tables.retain(|(owner, _), _| *owner != schema);
            self.schemas.remove(&schema);
        } else {
            p.expect_word("TABLE")?;
            p.expect_word("IF")?;
            p.expect_word("EXISTS")?;
            let key = p.table_ref()?;
            p.expect_word("CASCADE")?;
            self.tables.remove(&key);
        }
        Ok(Outcome::Count(0))
    }

    fn select(&mut self, p: &mut Parser<'_>) -> Result<Outcome> {
        let columns = p.ident_list()?;
        p.expect_word("FROM")?;
        let key = p.table_ref()?;
        let conditions = p.where_clause()?;

        let mut order = Vec::new();
        if p.eat_word("ORDER") {
            p.expect_word("BY")?;
            loop {
                let column = p.ident()?;
                let descending = if p.eat_word("DESC") {
                    true
                } else {
                    p.eat_word("ASC");
                    false
                };
                order.push((column, descending));
                if !p.eat_punct(',') {
                    break;
                }
            }
        }
        let limit = if p.eat_word("LIMIT") { Some(p.number()?) } else { None };
        let offset = if p.eat_word("OFFSET") { p.number()? } else { 0 };

        let table = self.table(&key)?;
        let mut rows: Vec<&Vec<Option<String>>> = table
            .matching(&conditions)?
            .into_iter()
            .map(|idx| &table.rows[idx])
            .collect();
        for (column, descending) in order.iter().rev() {
            let idx = table.index(column)?;
            rows.sort_by(|a, b| {
                let ordering = compare_cells(&a[idx], &b[idx]);
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let rows = rows
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| Self::project(table, row, &columns))
            .collect::<Result<Vec<_>>>()?;
        Ok(Outcome::Rows(rows))
    }

    fn insert(&mut self, p: &mut Parser<'_>) -> Result<Outcome> {
        p.expect_word("INTO")?;
        let key = p.table_ref()?;
        let (columns, values) = if p.eat_word("DEFAULT") {
            p.expect_word("VALUES")?;
            (Vec::new(), Vec::new())
        } else {
            let columns = p.ident_list()?;
            p.expect_word("VALUES")?;
            (columns, p.literal_list()?)
        };
        if columns.len() != values.len() {
            return Err(p.error("INSERT has more target columns than expressions"));
        }
        p.expect_word("RETURNING")?;
        let returning = p.ident_list()?;

        let row = {
            let table = self.table_mut(&key)?;
            let mut row = vec![None; table.columns.len()];
            for (column, value) in columns.iter().zip(values) {
                row[table.index(column)?] = value;
            }
            for (idx, column) in table.columns.iter().enumerate() {
                if column.serial && !columns.contains(&column.name) {
                    table.next_serial += 1;
                    row[idx] = Some(table.next_serial.to_string());
                }
            }
            row
        };
        self.check_row(&key, &row, None)?;

        let table = self.table_mut(&key)?;
        table.rows.push(row.clone());
        let returned = Self::project(table, &row, &returning)?;
        Ok(Outcome::Rows(vec![returned]))
    }

    fn update(&mut self, p: &mut Parser<'_>) -> Result<Outcome> {
        let key = p.table_ref()?;
        p.expect_word("SET")?;
        let (columns, values) = if p.peek() == Some(&Token::Punct('(')) {
            let columns = p.ident_list()?;
            p.expect_punct('=')?;
            (columns, p.literal_list()?)
        } else {
            let column = p.ident()?;
            p.expect_punct('=')?;
            (vec![column], vec![p.literal()?])
        };
        if columns.len() != values.len() {
            return Err(p.error("number of columns does not match number of values"));
        }
        let conditions = p.where_clause()?;

        let table = self.table(&key)?;
        let targets = table.matching(&conditions)?;
        let assignments = columns
            .iter()
            .map(|column| table.index(column))
            .collect::<Result<Vec<_>>>()?;

        let mut updated = Vec::with_capacity(targets.len());
        for &row_idx in &targets {
            let mut row = table.rows[row_idx].clone();
            for (&idx, value) in assignments.iter().zip(&values) {
                row[idx] = value.clone();
            }
            self.check_row(&key, &row, Some(row_idx))?;
            updated.push((row_idx, row));
        }

        let table = self.table_mut(&key)?;
        for (row_idx, row) in updated {
            table.rows[row_idx] = row;
        }
        Ok(Outcome::Count(targets.len() as u64))
    }

    fn delete(&mut self, p: &mut Parser<'_>) -> Result<Outcome> {
        p.expect_word("FROM")?;
        let key = p.table_ref()?;
        let conditions = p.where_clause()?;

        let table = self.table_mut(&key)?;
        let doomed: BTreeSet<usize> = table.matching(&conditions)?.into_iter().collect();
        let mut idx = 0;
        table.rows.retain(|_| {
            let keep = !doomed.contains(&idx);
            idx += 1;
            keep
        });
        Ok(Outcome::Count(doomed.len() as u64))
    }
}

/// In-process PostgreSQL stand-in
pub struct FakePostgres {
    store: Mutex<Store>,
    snapshot: Mutex<Option<Store>>,
    log: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
    connected: AtomicBool,
}

impl Default for FakePostgres {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePostgres {
    /// A connected, empty server
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            snapshot: Mutex::new(None),
            log: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            connected: AtomicBool::new(true),
        }
    }

    /// Every statement received, in order
    pub fn statements(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Statements received that start with `prefix`
    pub fn statements_starting_with(&self, prefix: &str) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter(|sql| sql.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Forget the statement log
    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    /// Reject every statement containing `pattern` until [`Self::stop_failing`]
    pub fn fail_statements_containing(&self, pattern: &str) {
        *self.fail_on.lock() = Some(pattern.to_string());
    }

    /// Accept statements again
    pub fn stop_failing(&self) {
        *self.fail_on.lock() = None;
    }

    /// Stored rows of a table as wire text
    pub fn rows(&self, schema: &str, table: &str) -> Vec<Vec<Option<String>>> {
        self.store
            .lock()
            .tables
            .get(&(schema.to_string(), table.to_string()))
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Whether a table exists
    pub fn has_table(&self, schema: &str, table: &str) -> bool {
        self.store
            .lock()
            .tables
            .contains_key(&(schema.to_string(), table.to_string()))
    }

    fn run(&self, sql: &str) -> Result<Outcome> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(DatabaseError::connection("Not connected to database"));
        }
        self.log.lock().push(sql.to_string());
        if let Some(pattern) = self.fail_on.lock().as_deref() {
            if sql.contains(pattern) {
                return Err(DatabaseError::query(format!("injected failure: {}", sql)));
            }
        }
        // Type creation blocks are idempotent on the server; nothing to model
        if sql.starts_with("DO $$") {
            return Ok(Outcome::Count(0));
        }
        self.store.lock().run(sql)
    }
}

#[async_trait]
impl Database for FakePostgres {
    async fn connect(&self, _connection_string: &str) -> Result<()> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    async fn execute(&self, query: &str) -> Result<u64> {
        match self.run(query)? {
            Outcome::Count(count) => Ok(count),
            Outcome::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    async fn query(&self, query: &str) -> Result<DatabaseResult> {
        match self.run(query)? {
            Outcome::Count(_) => Ok(Vec::new()),
            Outcome::Rows(rows) => Ok(rows),
        }
    }

    async fn begin_transaction(&self) -> Result<()> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            return Err(DatabaseError::transaction("Already in a transaction"));
        }
        *snapshot = Some(self.store.lock().clone());
        self.log.lock().push("BEGIN".to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        if self.snapshot.lock().take().is_none() {
            return Err(DatabaseError::transaction("Not in a transaction"));
        }
        self.log.lock().push("COMMIT".to_string());
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let saved = self
            .snapshot
            .lock()
            .take()
            .ok_or_else(|| DatabaseError::transaction("Not in a transaction"))?;
        *self.store.lock() = saved;
        self.log.lock().push("ROLLBACK".to_string());
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.lock().is_some()
    }
}
