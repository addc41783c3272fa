//! Warehouse layout: which tables exist, how they are keyed, and which
//! indexes, full-text tables and legacy views are built over them.
//!
//! [`SchemaConfig::default`] describes the Georgia SDWIS quarterly drop. The
//! whole structure is deserialisable so a deployment can override any part
//! of it from configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, coerce::RulesConfig, normalize::is_canonical};

// ─── Specs ───────────────────────────────────────────────────────────────────

/// A table loaded from a source file of the same (normalized) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
  pub name:        String,
  /// Ordered primary-key columns; empty means "no key".
  #[serde(default)]
  pub primary_key: Vec<String>,
}

/// A secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
  pub table:   String,
  pub columns: Vec<String>,
}

impl IndexSpec {
  /// `idx_<table>_<col>[_<col>...]`
  pub fn name(&self) -> String {
    format!("idx_{}_{}", self.table, self.columns.join("_"))
  }
}

/// An FTS5 index over text columns of a content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtsSpec {
  pub table:   String,
  pub columns: Vec<String>,
}

impl FtsSpec {
  pub fn fts_table(&self) -> String { format!("{}_fts", self.table) }
}

/// A view exposing a canonical table under a legacy name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpec {
  pub name:  String,
  pub table: String,
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
  /// File-name prefix shared by every source extract, e.g. `SDWA_`.
  pub source_prefix:     String,
  /// Tables expected in every drop, in load order.
  pub tables:            Vec<TableSpec>,
  pub indexes:           Vec<IndexSpec>,
  pub fts:               Option<FtsSpec>,
  pub views:             Vec<ViewSpec>,
  pub rules:             RulesConfig,
  /// Also load prefixed files that no [`TableSpec`] names (without a key).
  pub discover_unlisted: bool,
}

impl SchemaConfig {
  pub fn table(&self, name: &str) -> Option<&TableSpec> {
    self.tables.iter().find(|t| t.name == name)
  }

  /// Check that every identifier is canonical and names do not clash.
  pub fn validate(&self) -> Result<()> {
    let mut tables = BTreeSet::new();
    for spec in &self.tables {
      check_ident(&spec.name)?;
      spec.primary_key.iter().try_for_each(|c| check_ident(c))?;
      if !tables.insert(spec.name.as_str()) {
        return Err(Error::DuplicateTable(spec.name.clone()));
      }
    }

    for index in &self.indexes {
      check_ident(&index.table)?;
      if index.columns.is_empty() {
        return Err(Error::InvalidIdentifier(index.name()));
      }
      index.columns.iter().try_for_each(|c| check_ident(c))?;
    }

    if let Some(fts) = &self.fts {
      check_ident(&fts.table)?;
      if fts.columns.is_empty() {
        return Err(Error::InvalidIdentifier(fts.fts_table()));
      }
      fts.columns.iter().try_for_each(|c| check_ident(c))?;
    }

    for view in &self.views {
      check_ident(&view.name)?;
      check_ident(&view.table)?;
      if tables.contains(view.name.as_str()) {
        return Err(Error::ViewCollision(view.name.clone()));
      }
    }

    Ok(())
  }
}

fn check_ident(name: &str) -> Result<()> {
  if is_canonical(name) {
    Ok(())
  } else {
    Err(Error::InvalidIdentifier(name.to_owned()))
  }
}

// ─── Defaults ────────────────────────────────────────────────────────────────

const PERIOD: &str = "submissionyearquarter";
const PWSID: &str = "pwsid";

/// Primary keys of the Georgia SDWIS Q1-2025 drop.
const DEFAULT_KEYS: &[(&str, &[&str])] = &[
  ("events_milestones", &[PERIOD, PWSID, "event_schedule_id"]),
  ("facilities", &[PERIOD, PWSID, "facility_id"]),
  ("geographic_areas", &[PERIOD, PWSID, "geo_id"]),
  ("lcr_samples", &[PERIOD, PWSID, "sar_id"]),
  ("pn_violation_assoc", &["pn_violation_id"]),
  ("pub_water_systems", &[PERIOD, PWSID]),
  ("ref_ansi_areas", &["ansi_state_code", "ansi_entity_code"]),
  ("ref_code_values", &["value_type", "value_code"]),
  ("service_areas", &[PERIOD, PWSID, "service_area_type_code"]),
  ("site_visits", &[PERIOD, PWSID, "visit_id"]),
  ("violations_enforcement", &["violation_id"]),
];

/// Tables carrying a `pwsid` foreign key back to `pub_water_systems`.
const PWSID_TABLES: &[&str] = &[
  "pub_water_systems",
  "violations_enforcement",
  "facilities",
  "geographic_areas",
  "site_visits",
  "lcr_samples",
  "events_milestones",
  "service_areas",
  "pn_violation_assoc",
];

/// Columns the query layer filters on.
const FILTER_INDEXES: &[(&str, &str)] = &[
  ("violations_enforcement", "non_compl_per_begin_date"),
  ("pub_water_systems", "pws_type_code"),
  ("pub_water_systems", "population_served_count"),
];

fn owned(cols: &[&str]) -> Vec<String> { cols.iter().map(|c| (*c).to_owned()).collect() }

impl Default for SchemaConfig {
  fn default() -> Self {
    let tables = DEFAULT_KEYS
      .iter()
      .map(|(name, key)| TableSpec {
        name:        (*name).to_owned(),
        primary_key: owned(key),
      })
      .collect();

    let indexes = PWSID_TABLES
      .iter()
      .map(|table| IndexSpec {
        table:   (*table).to_owned(),
        columns: owned(&[PWSID]),
      })
      .chain(FILTER_INDEXES.iter().map(|(table, column)| IndexSpec {
        table:   (*table).to_owned(),
        columns: owned(&[*column]),
      }))
      .collect();

    Self {
      source_prefix: "SDWA_".to_owned(),
      tables,
      indexes,
      fts: Some(FtsSpec {
        table:   "pub_water_systems".to_owned(),
        columns: owned(&["pws_name"]),
      }),
      views: vec![
        ViewSpec {
          name:  "water_systems".to_owned(),
          table: "pub_water_systems".to_owned(),
        },
        ViewSpec {
          name:  "violations".to_owned(),
          table: "violations_enforcement".to_owned(),
        },
      ],
      rules: RulesConfig::default(),
      discover_unlisted: true,
    }
  }
}
