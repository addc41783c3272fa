//! Canonical naming for tables and columns.
//!
//! Source extracts arrive with upper-case, space- or punctuation-separated
//! headers (`PWS_NAME`, `Population Served Count`). Everything stored in the
//! warehouse uses the lower_snake_case form produced by [`normalize`].

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Convert an arbitrary header or file name to lower_snake_case.
///
/// Every run of characters outside `[a-z0-9]` (after lower-casing) becomes a
/// single `_`, and leading/trailing separators are dropped. The result is a
/// fixed point: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut pending_sep = false;

  for ch in name.chars().flat_map(char::to_lowercase) {
    if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
      if pending_sep && !out.is_empty() {
        out.push('_');
      }
      pending_sep = false;
      out.push(ch);
    } else {
      pending_sep = true;
    }
  }

  out
}

/// `true` if `name` is already in canonical form and non-empty.
pub fn is_canonical(name: &str) -> bool {
  !name.is_empty() && normalize(name) == name
}

/// Derive the table name for a source file stem, stripping `prefix`
/// (ASCII case-insensitive) when present.
///
/// `table_name_for("SDWA_LCR_Samples", "SDWA_") == "lcr_samples"`.
pub fn table_name_for(stem: &str, prefix: &str) -> String {
  let rest = match stem.get(..prefix.len()) {
    Some(head) if head.eq_ignore_ascii_case(prefix) => &stem[prefix.len()..],
    _ => stem,
  };
  normalize(rest)
}

/// A set of source headers that collapse onto one canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
  pub canonical: String,
  pub sources:   Vec<String>,
}

/// Report every canonical name produced by more than one source header.
pub fn find_collisions<S: AsRef<str>>(headers: &[S]) -> Vec<Collision> {
  let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
  for header in headers {
    let header = header.as_ref();
    by_name
      .entry(normalize(header))
      .or_default()
      .push(header.to_owned());
  }

  by_name
    .into_iter()
    .filter(|(_, sources)| sources.len() > 1)
    .map(|(canonical, sources)| Collision { canonical, sources })
    .collect()
}

/// Normalize a full header row.
///
/// Headers that normalize to nothing (blank or pure punctuation) are named
/// `column_<n>` by 1-based position. Collisions are an error; the caller
/// must not load a file whose columns cannot be told apart.
pub fn normalize_headers<S: AsRef<str>>(headers: &[S]) -> Result<Vec<String>> {
  let names: Vec<String> = headers
    .iter()
    .enumerate()
    .map(|(i, h)| {
      let name = normalize(h.as_ref());
      if name.is_empty() {
        format!("column_{}", i + 1)
      } else {
        name
      }
    })
    .collect();

  let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
  for (i, name) in names.iter().enumerate() {
    if let Some(first) = seen.insert(name.as_str(), i) {
      return Err(Error::ColumnCollision {
        canonical: name.clone(),
        sources:   vec![
          headers[first].as_ref().to_owned(),
          headers[i].as_ref().to_owned(),
        ],
      });
    }
  }

  Ok(names)
}
