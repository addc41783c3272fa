//! Source extracts: locating them on disk and reading one into a [`Table`].

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use sdwis_core::{
  coerce::{CoercionRules, ColumnKind},
  normalize::{normalize_headers, table_name_for},
  value::{Column, Table},
};

use crate::{Error, Result};

/// Map every `<prefix>*.csv` file in `dir` to the table it feeds.
///
/// Matching on both prefix and extension is ASCII case-insensitive. When two
/// files feed the same table, the first by path wins and the other is
/// ignored with a warning. The map is ordered, so load order is stable.
pub fn discover(dir: &Path, prefix: &str) -> Result<BTreeMap<String, PathBuf>> {
  let io_err = |source| Error::Io {
    path: dir.to_path_buf(),
    source,
  };

  let mut paths = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(io_err)? {
    let path = entry.map_err(io_err)?.path();
    if path.is_file() && is_source_file(&path, prefix) {
      paths.push(path);
    }
  }
  paths.sort();

  let mut sources = BTreeMap::new();
  for path in paths {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
      continue;
    };
    let table = table_name_for(stem, prefix);
    if table.is_empty() {
      continue;
    }
    if let Some(first) = sources.get(&table) {
      tracing::warn!(?path, kept = ?first, %table, "duplicate source for table ignored");
      continue;
    }
    sources.insert(table, path);
  }

  Ok(sources)
}

fn is_source_file(path: &Path, prefix: &str) -> bool {
  let is_csv = path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
  let has_prefix = path
    .file_name()
    .and_then(|n| n.to_str())
    .and_then(|n| n.get(..prefix.len()))
    .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
  is_csv && has_prefix
}

/// Conventional file name for a table whose source was not found.
pub fn expected_file_name(prefix: &str, table: &str) -> String {
  format!("{prefix}{}.csv", table.to_ascii_uppercase())
}

/// Read a whole delimited file into memory as table `name`.
///
/// Columns are identified by header name only. Cells are coerced according
/// to `rules`; a row whose width differs from the header fails the file.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_table(path: &Path, name: &str, rules: &CoercionRules) -> Result<Table> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_path(path)?;

  let headers: Vec<String> = reader
    .byte_headers()?
    .iter()
    .map(|h| String::from_utf8_lossy(h).into_owned())
    .collect();
  if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
    return Err(Error::NoHeader(path.to_path_buf()));
  }

  let columns: Vec<Column> = normalize_headers(&headers)?
    .into_iter()
    .map(|name| Column {
      kind: rules.classify(&name),
      name,
    })
    .collect();
  let kinds: Vec<_> = columns.iter().map(|c| c.kind).collect();

  let mut table = Table::new(name, columns);
  for record in reader.byte_records() {
    let record = record?;
    let row = record
      .iter()
      .enumerate()
      .map(|(i, raw)| {
        let kind = kinds.get(i).copied().unwrap_or(ColumnKind::Text);
        rules.coerce_cell(kind, &String::from_utf8_lossy(raw))
      })
      .collect();
    table.push_row(row)?;
  }

  Ok(table)
}
