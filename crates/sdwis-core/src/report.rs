//! The outcome of one loader run, expressed as data.
//!
//! Every table load and every post-load step produces a value here instead
//! of only a log line, so an operator (or a health check reading the JSON
//! form) can tell a fully populated warehouse from a partial one.

use std::path::PathBuf;

use serde::Serialize;

use crate::Result;

// ─── Tables ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
  Loaded {
    rows:        u64,
    /// The key actually enforced; `None` if the table was loaded unkeyed.
    primary_key: Option<Vec<String>>,
  },
  /// No source file was found; the table was left untouched.
  Missing { expected: String },
  Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
  pub table:   String,
  pub source:  Option<PathBuf>,
  pub outcome: TableOutcome,
}

impl TableReport {
  pub fn is_loaded(&self) -> bool { matches!(self.outcome, TableOutcome::Loaded { .. }) }

  pub fn rows(&self) -> u64 {
    match self.outcome {
      TableOutcome::Loaded { rows, .. } => rows,
      _ => 0,
    }
  }
}

// ─── Post-load steps ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
  Created,
  /// The step's prerequisites (table or column) were absent.
  Skipped { reason: String },
  Failed { reason: String },
}

/// An index, full-text table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
  pub name:    String,
  pub outcome: StepOutcome,
}

impl StepReport {
  pub fn created(name: impl Into<String>) -> Self {
    Self {
      name:    name.into(),
      outcome: StepOutcome::Created,
    }
  }

  pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      name:    name.into(),
      outcome: StepOutcome::Skipped { reason: reason.into() },
    }
  }

  pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      name:    name.into(),
      outcome: StepOutcome::Failed { reason: reason.into() },
    }
  }
}

// ─── Run ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub tables:  Vec<TableReport>,
  pub indexes: Vec<StepReport>,
  pub fts:     Option<StepReport>,
  pub views:   Vec<StepReport>,
}

impl RunReport {
  pub fn table(&self, name: &str) -> Option<&TableReport> {
    self.tables.iter().find(|t| t.table == name)
  }

  pub fn loaded(&self) -> impl Iterator<Item = &TableReport> {
    self.tables.iter().filter(|t| t.is_loaded())
  }

  pub fn missing(&self) -> impl Iterator<Item = &TableReport> {
    self
      .tables
      .iter()
      .filter(|t| matches!(t.outcome, TableOutcome::Missing { .. }))
  }

  pub fn failed(&self) -> impl Iterator<Item = &TableReport> {
    self
      .tables
      .iter()
      .filter(|t| matches!(t.outcome, TableOutcome::Failed { .. }))
  }

  pub fn steps(&self) -> impl Iterator<Item = &StepReport> {
    self.indexes.iter().chain(self.fts.iter()).chain(self.views.iter())
  }

  pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
    self
      .steps()
      .filter(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
  }

  pub fn total_rows(&self) -> u64 { self.tables.iter().map(TableReport::rows).sum() }

  /// No table missing or failed, and no step failed.
  pub fn is_complete(&self) -> bool {
    self.missing().next().is_none()
      && self.failed().next().is_none()
      && self.failed_steps().next().is_none()
  }

  /// Process exit status: non-zero when anything failed, or (with `strict`)
  /// when an expected source file was missing.
  pub fn exit_code(&self, strict: bool) -> i32 {
    let failed = self.failed().next().is_some() || self.failed_steps().next().is_some();
    let missing = self.missing().next().is_some();
    if failed || (strict && missing) { 1 } else { 0 }
  }

  pub fn to_json_pretty(&self) -> Result<String> { Ok(serde_json::to_string_pretty(self)?) }
}
