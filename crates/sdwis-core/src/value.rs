//! In-memory tabular data: the unit handed from the reader to a warehouse.

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{Error, Result, coerce::ColumnKind};

// ─── Cells ───────────────────────────────────────────────────────────────────

/// A single coerced cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_integer(&self) -> Option<i64> {
    match self {
      Value::Integer(i) => Some(*i),
      _ => None,
    }
  }
}

impl std::fmt::Display for Value {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Integer(i) => write!(f, "{i}"),
      Value::Real(r) => write!(f, "{r}"),
      Value::Text(s) => f.write_str(s),
    }
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
  pub name: String,
  pub kind: ColumnKind,
}

/// A fully materialised source table. Every row has exactly one cell per
/// column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
  name:    String,
  columns: Vec<Column>,
  rows:    Vec<Vec<Value>>,
}

impl Table {
  pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
    Self {
      name: name.into(),
      columns,
      rows: Vec::new(),
    }
  }

  /// Append a row, rejecting one whose width differs from the header.
  pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
    if row.len() != self.columns.len() {
      return Err(Error::RaggedRow {
        row:      self.rows.len() + 1,
        expected: self.columns.len(),
        found:    row.len(),
      });
    }
    self.rows.push(row);
    Ok(())
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn columns(&self) -> &[Column] { &self.columns }

  pub fn rows(&self) -> &[Vec<Value>] { &self.rows }

  pub fn row_count(&self) -> usize { self.rows.len() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c.name == name)
  }

  /// `true` if every name in `names` is a column of this table.
  pub fn has_columns<S: AsRef<str>>(&self, names: &[S]) -> bool {
    names.iter().all(|n| self.column_index(n.as_ref()).is_some())
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One result row read back from the warehouse, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
  pub fields: Vec<(String, Value)>,
}

impl Record {
  pub fn get(&self, column: &str) -> Option<&Value> {
    self
      .fields
      .iter()
      .find(|(name, _)| name == column)
      .map(|(_, v)| v)
  }
}

impl Serialize for Record {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.fields.len()))?;
    for (name, value) in &self.fields {
      map.serialize_entry(name, value)?;
    }
    map.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn systems() -> Table {
    Table::new(
      "pub_water_systems",
      vec![
        Column { name: "pwsid".into(), kind: ColumnKind::Text },
        Column { name: "population_served_count".into(), kind: ColumnKind::Numeric },
      ],
    )
  }

  #[test]
  fn rejects_ragged_rows() {
    let mut t = systems();
    t.push_row(vec![Value::Text("GA0010000".into()), Value::Integer(10)])
      .unwrap();
    let err = t.push_row(vec![Value::Null]).unwrap_err();
    assert!(matches!(
      err,
      Error::RaggedRow { row: 2, expected: 2, found: 1 }
    ));
    assert_eq!(t.row_count(), 1);
  }

  #[test]
  fn column_lookup() {
    let t = systems();
    assert_eq!(t.column_index("population_served_count"), Some(1));
    assert!(t.has_columns(&["pwsid"]));
    assert!(!t.has_columns(&["pwsid", "geo_id"]));
  }

  #[test]
  fn record_serializes_as_ordered_map() {
    let record = Record {
      fields: vec![
        ("pwsid".into(), Value::Text("GA0010000".into())),
        ("population_served_count".into(), Value::Null),
      ],
    };
    assert_eq!(record.get("pwsid").and_then(Value::as_text), Some("GA0010000"));
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, r#"{"pwsid":"GA0010000","population_served_count":null}"#);
  }
}
