//! Name-driven type coercion.
//!
//! A column's storage kind is decided from its canonical name alone, never by
//! sampling values. A misleadingly named column is coerced literally; the
//! `overrides` map is the escape hatch for known offenders.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{Result, value::Value};

pub const DEFAULT_DATE_PATTERN: &str = r"_date$|_date_|_dt$|_dt_|^date_|^date$";
pub const DEFAULT_NUMERIC_PATTERN: &str = r"(^|_)count(_|$)|(^|_)measure(_|$)";

/// Calendar dates outside this range are treated as unparseable.
const MIN_YEAR: i32 = 1800;
const MAX_YEAR: i32 = 2200;

const DATE_FORMATS: &[&str] = &[
  "%Y-%m-%d",
  "%Y/%m/%d",
  "%m/%d/%Y",
  "%m/%d/%y",
  "%d-%b-%Y",
  "%d-%b-%y",
  "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%m/%d/%Y %H:%M:%S",
  "%m/%d/%Y %H:%M",
  "%m/%d/%Y %I:%M:%S %p",
];

// ─── Column kinds ────────────────────────────────────────────────────────────

/// How the cells of a column are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
  /// ISO 8601 `YYYY-MM-DD` text, or NULL.
  Date,
  /// Integer or finite real, or NULL.
  Numeric,
  /// Passthrough.
  Text,
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Serializable form of [`CoercionRules`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
  pub date_pattern:    String,
  pub numeric_pattern: String,
  /// Explicit kinds by canonical column name; consulted before the patterns.
  /// Merged over the built-in overrides, so a configured map adds entries
  /// (or changes a built-in one) rather than replacing them all.
  pub overrides:       BTreeMap<String, ColumnKind>,
  /// Cell contents (after trimming) that mean "no value" in every column.
  pub null_markers:    Vec<String>,
}

impl Default for RulesConfig {
  fn default() -> Self {
    Self {
      date_pattern:    DEFAULT_DATE_PATTERN.to_owned(),
      numeric_pattern: DEFAULT_NUMERIC_PATTERN.to_owned(),
      overrides:       default_overrides(),
      null_markers:    ["NA", "N/A", "n/a", "NULL", "null", "NaN", "nan", "None", "<NA>", "#N/A"]
        .into_iter()
        .map(str::to_owned)
        .collect(),
    }
  }
}

/// `unit_of_measure` matches the numeric pattern but holds unit strings.
fn default_overrides() -> BTreeMap<String, ColumnKind> {
  BTreeMap::from([("unit_of_measure".to_owned(), ColumnKind::Text)])
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Compiled column classification and cell coercion rules.
#[derive(Debug, Clone)]
pub struct CoercionRules {
  date:         Regex,
  numeric:      Regex,
  overrides:    BTreeMap<String, ColumnKind>,
  null_markers: Vec<String>,
}

impl CoercionRules {
  pub fn compile(config: &RulesConfig) -> Result<Self> {
    Ok(Self {
      date:         build_pattern(&config.date_pattern)?,
      numeric:      build_pattern(&config.numeric_pattern)?,
      overrides:    default_overrides()
        .into_iter()
        .chain(config.overrides.clone())
        .collect(),
      null_markers: config.null_markers.clone(),
    })
  }

  /// Decide a column's kind from its canonical name.
  pub fn classify(&self, column: &str) -> ColumnKind {
    if let Some(kind) = self.overrides.get(column) {
      *kind
    } else if self.date.is_match(column) {
      ColumnKind::Date
    } else if self.numeric.is_match(column) {
      ColumnKind::Numeric
    } else {
      ColumnKind::Text
    }
  }

  /// Coerce one raw cell. Never fails: anything that does not fit `kind`
  /// becomes [`Value::Null`].
  pub fn coerce_cell(&self, kind: ColumnKind, raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() || self.null_markers.iter().any(|m| m == s) {
      return Value::Null;
    }
    match kind {
      ColumnKind::Date => coerce_date(s)
        .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null),
      ColumnKind::Numeric => coerce_numeric(s),
      ColumnKind::Text => Value::Text(s.to_owned()),
    }
  }
}

fn build_pattern(pattern: &str) -> Result<Regex> {
  Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

// ─── Cell parsers ────────────────────────────────────────────────────────────

/// Parse a date or datetime in any of the formats seen in SDWIS extracts,
/// truncating datetimes to their calendar date.
pub fn coerce_date(raw: &str) -> Option<NaiveDate> {
  let s = raw.trim();

  DATE_FORMATS
    .iter()
    .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    .find(|d| plausible(*d))
    .or_else(|| {
      DATETIME_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .find(|d| plausible(*d))
    })
    .or_else(|| {
      DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
        .filter(|d| plausible(*d))
    })
}

fn plausible(d: NaiveDate) -> bool { (MIN_YEAR..=MAX_YEAR).contains(&d.year()) }

/// Parse an integer, falling back to a finite real. Anything else is NULL.
pub fn coerce_numeric(raw: &str) -> Value {
  let s = raw.trim();
  if let Ok(i) = s.parse::<i64>() {
    return Value::Integer(i);
  }
  match s.parse::<f64>() {
    Ok(f) if f.is_finite() => Value::Real(f),
    _ => Value::Null,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> { NaiveDate::from_ymd_opt(y, m, d) }

  fn rules() -> CoercionRules {
    CoercionRules::compile(&RulesConfig::default()).unwrap()
  }

  #[test]
  fn classifies_by_name() {
    let rules = rules();
    assert_eq!(rules.classify("non_compl_per_begin_date"), ColumnKind::Date);
    assert_eq!(rules.classify("visit_date"), ColumnKind::Date);
    assert_eq!(rules.classify("sample_dt"), ColumnKind::Date);
    assert_eq!(rules.classify("date_received"), ColumnKind::Date);
    assert_eq!(rules.classify("population_served_count"), ColumnKind::Numeric);
    assert_eq!(rules.classify("sample_measure"), ColumnKind::Numeric);
    assert_eq!(rules.classify("service_connections_count"), ColumnKind::Numeric);
    assert_eq!(rules.classify("pws_name"), ColumnKind::Text);
    assert_eq!(rules.classify("pwsid"), ColumnKind::Text);
    assert_eq!(rules.classify("county_served"), ColumnKind::Text);
    assert_eq!(rules.classify("update_dates"), ColumnKind::Text);
  }

  #[test]
  fn overrides_win_over_patterns() {
    let rules = rules();
    assert_eq!(rules.classify("unit_of_measure"), ColumnKind::Text);

    let mut config = RulesConfig::default();
    config.overrides.insert("pws_name".into(), ColumnKind::Numeric);
    config.overrides.insert("visit_date".into(), ColumnKind::Text);
    let rules = CoercionRules::compile(&config).unwrap();
    assert_eq!(rules.classify("pws_name"), ColumnKind::Numeric);
    assert_eq!(rules.classify("visit_date"), ColumnKind::Text);
  }

  #[test]
  fn configured_overrides_extend_the_built_in_ones() {
    let config = RulesConfig {
      overrides: BTreeMap::from([("pws_name".to_owned(), ColumnKind::Numeric)]),
      ..RulesConfig::default()
    };
    let rules = CoercionRules::compile(&config).unwrap();
    assert_eq!(rules.classify("pws_name"), ColumnKind::Numeric);
    assert_eq!(rules.classify("unit_of_measure"), ColumnKind::Text);
    assert_eq!(
      rules.coerce_cell(rules.classify("unit_of_measure"), "MG/L"),
      Value::Text("MG/L".into())
    );

    let config = RulesConfig {
      overrides: BTreeMap::from([("unit_of_measure".to_owned(), ColumnKind::Numeric)]),
      ..RulesConfig::default()
    };
    let rules = CoercionRules::compile(&config).unwrap();
    assert_eq!(rules.classify("unit_of_measure"), ColumnKind::Numeric);
  }

  #[test]
  fn patterns_are_case_insensitive() {
    let rules = rules();
    assert_eq!(rules.classify("FIRST_REPORTED_DATE"), ColumnKind::Date);
  }

  #[test]
  fn bad_pattern_is_an_error() {
    let config = RulesConfig {
      date_pattern: "(".into(),
      ..RulesConfig::default()
    };
    assert!(CoercionRules::compile(&config).is_err());
  }

  #[test]
  fn parses_common_date_shapes() {
    assert_eq!(coerce_date("2024-01-15"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("2024/01/15"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("01/15/2024"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("1/5/24"), ymd(2024, 1, 5));
    assert_eq!(coerce_date("15-JAN-24"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("15-Jan-2024"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("20240115"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("2024-01-15 13:45:00"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("2024-01-15T13:45:00"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("2024-01-15T13:45:00Z"), ymd(2024, 1, 15));
    assert_eq!(coerce_date("01/15/2024 08:30"), ymd(2024, 1, 15));
  }

  #[test]
  fn unparseable_dates_are_none() {
    for raw in ["", "soon", "2024-13-01", "02/30/2024", "0001-01-01", "12345", "--"] {
      assert_eq!(coerce_date(raw), None, "{raw:?} should not parse");
    }
  }

  #[test]
  fn numeric_coercion() {
    assert_eq!(coerce_numeric("1500"), Value::Integer(1500));
    assert_eq!(coerce_numeric(" -3 "), Value::Integer(-3));
    assert_eq!(coerce_numeric("0.015"), Value::Real(0.015));
    assert_eq!(coerce_numeric("1e3"), Value::Real(1000.0));
    assert_eq!(coerce_numeric("1,500"), Value::Null);
    assert_eq!(coerce_numeric("abc"), Value::Null);
    assert_eq!(coerce_numeric("inf"), Value::Null);
    assert_eq!(coerce_numeric("NaN"), Value::Null);
  }

  #[test]
  fn cell_coercion_never_fails() {
    let rules = rules();
    assert_eq!(
      rules.coerce_cell(ColumnKind::Date, "01/15/2024"),
      Value::Text("2024-01-15".into())
    );
    assert_eq!(rules.coerce_cell(ColumnKind::Date, "not a date"), Value::Null);
    assert_eq!(rules.coerce_cell(ColumnKind::Numeric, "12x"), Value::Null);
    assert_eq!(rules.coerce_cell(ColumnKind::Numeric, "  "), Value::Null);
    assert_eq!(rules.coerce_cell(ColumnKind::Text, "N/A"), Value::Null);
    assert_eq!(
      rules.coerce_cell(ColumnKind::Text, "  CITY OF ATLANTA "),
      Value::Text("CITY OF ATLANTA".into())
    );
  }
}
