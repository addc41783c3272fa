//! Translation between domain values and SQLite: cell encoding, identifier
//! quoting and the DDL/DML text generated per source table.
//!
//! Identifiers are always double-quoted. Dates are stored as ISO 8601 text
//! under a `TEXT` declared type; numeric columns use `NUMERIC` affinity.

use rusqlite::types::{ToSqlOutput, ValueRef};
use sdwis_core::{
  coerce::ColumnKind,
  value::{Table, Value},
};

// ─── Identifiers ──────────────────────────────────────────────────────────────

pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

fn quote_literal(s: &str) -> String { format!("'{}'", s.replace('\'', "''")) }

fn column_list(columns: &[String]) -> String {
  columns
    .iter()
    .map(|c| quote_ident(c))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Cells ────────────────────────────────────────────────────────────────────

pub fn declared_type(kind: ColumnKind) -> &'static str {
  match kind {
    ColumnKind::Date | ColumnKind::Text => "TEXT",
    ColumnKind::Numeric => "NUMERIC",
  }
}

pub fn encode_value(v: &Value) -> ToSqlOutput<'_> {
  match v {
    Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
    Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
    Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
    Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
  }
}

pub fn decode_value(v: ValueRef<'_>) -> Value {
  match v {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Integer(i),
    ValueRef::Real(r) => Value::Real(r),
    ValueRef::Text(b) | ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
  }
}

// ─── Statements ───────────────────────────────────────────────────────────────

pub fn drop_table_sql(name: &str) -> String { format!("DROP TABLE IF EXISTS {}", quote_ident(name)) }

pub fn create_table_sql(table: &Table, primary_key: Option<&[String]>) -> String {
  let mut defs: Vec<String> = table
    .columns()
    .iter()
    .map(|c| format!("{} {}", quote_ident(&c.name), declared_type(c.kind)))
    .collect();

  if let Some(key) = primary_key
    && !key.is_empty()
  {
    defs.push(format!("PRIMARY KEY ({})", column_list(key)));
  }

  format!(
    "CREATE TABLE {} (\n  {}\n)",
    quote_ident(table.name()),
    defs.join(",\n  ")
  )
}

/// `INSERT OR REPLACE` so duplicate keys resolve last-write-wins.
pub fn insert_sql(table: &Table) -> String {
  let names: Vec<String> = table.columns().iter().map(|c| c.name.clone()).collect();
  let params: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
    quote_ident(table.name()),
    column_list(&names),
    params.join(", ")
  )
}

pub fn create_index_sql(index: &str, table: &str, columns: &[String]) -> String {
  format!(
    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
    quote_ident(index),
    quote_ident(table),
    column_list(columns)
  )
}

/// Drop, recreate and repopulate an external-content FTS5 table.
pub fn rebuild_fts_sql(fts_table: &str, content_table: &str, columns: &[String]) -> String {
  let fts = quote_ident(fts_table);
  format!(
    "DROP TABLE IF EXISTS {fts};
     CREATE VIRTUAL TABLE {fts} USING fts5({cols}, content={content}, content_rowid='rowid');
     INSERT INTO {fts}({fts}) VALUES('rebuild');",
    cols = column_list(columns),
    content = quote_literal(content_table),
  )
}

pub fn create_view_sql(view: &str, table: &str) -> String {
  let view = quote_ident(view);
  format!(
    "DROP VIEW IF EXISTS {view};
     CREATE VIEW {view} AS SELECT * FROM {};",
    quote_ident(table)
  )
}

pub fn search_sql(fts_table: &str, content_table: &str) -> String {
  let fts = quote_ident(fts_table);
  format!(
    "SELECT c.* FROM {fts}
     JOIN {} AS c ON c.rowid = {fts}.rowid
     WHERE {fts} MATCH ?1
     ORDER BY {fts}.rank, c.rowid
     LIMIT ?2",
    quote_ident(content_table)
  )
}

/// Turn free text into an FTS5 query: every whitespace-separated token
/// becomes a quoted string, so the tokens are ANDed and user punctuation is
/// never parsed as query syntax. `None` if there are no tokens.
pub fn fts_query(term: &str) -> Option<String> {
  let tokens: Vec<String> = term
    .split_whitespace()
    .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
    .collect();
  if tokens.is_empty() {
    None
  } else {
    Some(tokens.join(" "))
  }
}
