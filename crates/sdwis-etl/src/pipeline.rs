//! The load run: one sequential pass over the source directory.
//!
//! Failures are contained per file and per step. Each produces a value in
//! the [`RunReport`] and a log line; nothing short of an unreadable source
//! directory aborts the run.

use std::path::{Path, PathBuf};

use sdwis_core::{
  coerce::CoercionRules,
  report::{RunReport, StepReport, TableOutcome, TableReport},
  schema::{SchemaConfig, TableSpec},
  store::Warehouse,
};
use tracing::{error, info, warn};

use crate::{
  Error, Result,
  source::{discover, expected_file_name, read_table},
};

pub struct Pipeline<W> {
  warehouse: W,
  schema:    SchemaConfig,
  rules:     CoercionRules,
}

impl<W> Pipeline<W>
where
  W: Warehouse,
{
  /// Validate `schema` and compile its coercion rules.
  pub fn new(warehouse: W, schema: SchemaConfig) -> Result<Self> {
    schema.validate()?;
    let rules = CoercionRules::compile(&schema.rules)?;
    Ok(Self {
      warehouse,
      schema,
      rules,
    })
  }

  pub fn warehouse(&self) -> &W { &self.warehouse }

  pub fn schema(&self) -> &SchemaConfig { &self.schema }

  /// Rebuild the warehouse from the extracts in `source_dir`.
  pub async fn run(&self, source_dir: &Path) -> Result<RunReport> {
    info!(source_dir = ?source_dir, "starting load");
    let mut sources = discover(source_dir, &self.schema.source_prefix)?;
    let mut report = RunReport::default();

    for spec in &self.schema.tables {
      let table_report = match sources.remove(&spec.name) {
        Some(path) => self.load_table(&spec.name, path, Some(spec)).await,
        None => {
          let expected = expected_file_name(&self.schema.source_prefix, &spec.name);
          warn!(table = %spec.name, file = %expected, "source file not found; table skipped");
          TableReport {
            table:   spec.name.clone(),
            source:  None,
            outcome: TableOutcome::Missing { expected },
          }
        }
      };
      report.tables.push(table_report);
    }

    // Whatever is left was discovered but not configured.
    for (name, path) in sources {
      if !self.schema.discover_unlisted {
        info!(table = %name, ?path, "unlisted source ignored");
        continue;
      }
      if self.schema.views.iter().any(|v| v.name == name) {
        warn!(table = %name, ?path, "unlisted source shadows a legacy view; ignored");
        continue;
      }
      report.tables.push(self.load_table(&name, path, None).await);
    }

    report.indexes = self.build_indexes().await;
    report.fts = self.build_fts().await;
    report.views = self.build_views().await;

    info!(
      loaded  = report.loaded().count(),
      missing = report.missing().count(),
      failed  = report.failed().count(),
      rows    = report.total_rows(),
      "load finished"
    );
    Ok(report)
  }

  async fn load_table(&self, name: &str, path: PathBuf, spec: Option<&TableSpec>) -> TableReport {
    info!(table = %name, ?path, "loading");
    let outcome = match self.try_load_table(name, &path, spec).await {
      Ok((rows, primary_key)) => {
        info!(table = %name, rows, pk = ?primary_key, "loaded");
        TableOutcome::Loaded { rows, primary_key }
      }
      Err(e) => {
        error!(table = %name, ?path, error = %e, "load failed");
        TableOutcome::Failed { reason: e.to_string() }
      }
    };
    TableReport {
      table: name.to_owned(),
      source: Some(path),
      outcome,
    }
  }

  async fn try_load_table(
    &self,
    name: &str,
    path: &Path,
    spec: Option<&TableSpec>,
  ) -> Result<(u64, Option<Vec<String>>)> {
    let table = {
      let (path, name, rules) = (path.to_path_buf(), name.to_owned(), self.rules.clone());
      tokio::task::spawn_blocking(move || read_table(&path, &name, &rules)).await??
    };

    let primary_key = match spec {
      Some(spec) if !spec.primary_key.is_empty() => {
        if table.has_columns(&spec.primary_key) {
          Some(spec.primary_key.clone())
        } else {
          warn!(
            table = %name,
            pk = ?spec.primary_key,
            "declared key columns absent from source; loading without a key"
          );
          None
        }
      }
      _ => None,
    };

    let rows = self
      .warehouse
      .replace_table(table, primary_key.clone())
      .await
      .map_err(store_err)?;
    Ok((rows, primary_key))
  }

  /// `None` when `columns` are all present on `table`, else why not.
  async fn missing_prerequisite(&self, table: &str, columns: &[String]) -> Result<Option<String>> {
    let present = self
      .warehouse
      .table_columns(table)
      .await
      .map_err(store_err)?;
    if present.is_empty() {
      return Ok(Some(format!("table {table} does not exist")));
    }
    Ok(
      columns
        .iter()
        .find(|c| !present.contains(c))
        .map(|c| format!("table {table} has no column {c}")),
    )
  }

  async fn build_indexes(&self) -> Vec<StepReport> {
    let mut steps = Vec::with_capacity(self.schema.indexes.len());
    for spec in &self.schema.indexes {
      let name = spec.name();
      let step = match self.missing_prerequisite(&spec.table, &spec.columns).await {
        Ok(Some(reason)) => {
          warn!(index = %name, %reason, "index skipped");
          StepReport::skipped(name, reason)
        }
        Ok(None) => match self.warehouse.create_index(spec).await {
          Ok(name) => {
            info!(index = %name, "index created");
            StepReport::created(name)
          }
          Err(e) => {
            error!(index = %name, error = %e, "index failed");
            StepReport::failed(name, e.to_string())
          }
        },
        Err(e) => StepReport::failed(name, e.to_string()),
      };
      steps.push(step);
    }
    steps
  }

  async fn build_fts(&self) -> Option<StepReport> {
    let spec = self.schema.fts.as_ref()?;
    let name = spec.fts_table();
    let step = match self.missing_prerequisite(&spec.table, &spec.columns).await {
      Ok(Some(reason)) => {
        warn!(fts = %name, %reason, "full-text index skipped");
        StepReport::skipped(name, reason)
      }
      Ok(None) => match self.warehouse.enable_fts(spec).await {
        Ok(()) => {
          info!(fts = %name, columns = ?spec.columns, "full-text index built");
          return Some(StepReport::created(name));
        }
        Err(e) => {
          error!(fts = %name, error = %e, "full-text index failed");
          StepReport::failed(name, e.to_string())
        }
      },
      Err(e) => StepReport::failed(name, e.to_string()),
    };

    // An index left over from an earlier run would point at old rowids.
    if let Err(e) = self.warehouse.drop_fts(spec).await {
      error!(fts = %spec.fts_table(), error = %e, "stale full-text index not dropped");
      return Some(StepReport::failed(spec.fts_table(), e.to_string()));
    }
    Some(step)
  }

  async fn build_views(&self) -> Vec<StepReport> {
    let mut steps = Vec::with_capacity(self.schema.views.len());
    for spec in &self.schema.views {
      let step = match self.warehouse.table_exists(&spec.table).await {
        Ok(false) => {
          let reason = format!("table {} does not exist", spec.table);
          warn!(view = %spec.name, %reason, "view skipped");
          StepReport::skipped(&spec.name, reason)
        }
        Ok(true) => match self.warehouse.create_view(spec).await {
          Ok(()) => {
            info!(view = %spec.name, table = %spec.table, "view created");
            StepReport::created(&spec.name)
          }
          Err(e) => {
            error!(view = %spec.name, error = %e, "view failed");
            StepReport::failed(&spec.name, e.to_string())
          }
        },
        Err(e) => StepReport::failed(&spec.name, e.to_string()),
      };
      steps.push(step);
    }
    steps
  }
}

fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}
