//! sdwis-etl binary.
//!
//! Rebuilds the SQLite warehouse from a directory of SDWIS extracts, and
//! offers a full-text lookup over water-system names against the result.
//!
//! # Usage
//!
//! ```text
//! sdwis-etl                                   # same as `sdwis-etl ingest`
//! sdwis-etl ingest --source data/ --report run.json --strict
//! sdwis-etl search "okefenokee" --limit 5
//! ```

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sdwis_core::{store::Warehouse, value::Record};
use sdwis_etl::{EtlConfig, Pipeline};
use sdwis_store_sqlite::SqliteWarehouse;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "SDWIS drinking-water data loader")]
struct Cli {
  /// Path to a TOML configuration file.
  #[arg(short, long, global = true, env = "SDWIS_CONFIG", default_value = "sdwis.toml")]
  config: PathBuf,

  /// SQLite file to build or query (overrides the config file).
  #[arg(long, global = true, env = "SDWIS_DATABASE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Rebuild the warehouse from the source extracts.
  Ingest {
    /// Directory holding the `SDWA_*.csv` files (overrides the config file).
    #[arg(long, env = "SDWIS_SOURCE_DIR")]
    source: Option<PathBuf>,

    /// Also write the run report as JSON to this file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Exit non-zero when an expected source file is missing.
    #[arg(long)]
    strict: bool,
  },

  /// Full-text search over water-system names.
  Search {
    term: String,

    #[arg(short, long, default_value_t = 20)]
    limit: usize,

    /// Print each hit as a JSON object instead of a summary line.
    #[arg(long)]
    json: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut config = EtlConfig::load(Some(&cli.config))
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  if let Some(database) = cli.database {
    config.database = database;
  }

  match cli.command.unwrap_or(Command::Ingest {
    source: None,
    report: None,
    strict: false,
  }) {
    Command::Ingest {
      source,
      report,
      strict,
    } => {
      if let Some(source) = source {
        config.source_dir = source;
      }
      ingest(config, report.as_deref(), strict).await
    }
    Command::Search { term, limit, json } => {
      search(&config, &term, limit, json).await?;
      Ok(ExitCode::SUCCESS)
    }
  }
}

async fn ingest(config: EtlConfig, report_path: Option<&Path>, strict: bool) -> anyhow::Result<ExitCode> {
  let warehouse = SqliteWarehouse::open(&config.database)
    .await
    .with_context(|| format!("failed to open warehouse at {:?}", config.database))?;

  let pipeline = Pipeline::new(warehouse, config.schema).context("invalid schema configuration")?;
  let report = pipeline
    .run(&config.source_dir)
    .await
    .with_context(|| format!("failed to read sources from {:?}", config.source_dir))?;

  if let Some(path) = report_path {
    let json = report.to_json_pretty()?;
    std::fs::write(path, json).with_context(|| format!("failed to write report to {path:?}"))?;
    tracing::info!(?path, "run report written");
  }

  for table in report.missing() {
    tracing::warn!(table = %table.table, "not loaded: source missing");
  }
  for table in report.failed() {
    tracing::error!(table = %table.table, "not loaded: load failed");
  }
  tracing::info!(database = ?config.database, complete = report.is_complete(), "warehouse rebuilt");

  Ok(match report.exit_code(strict) {
    0 => ExitCode::SUCCESS,
    _ => ExitCode::FAILURE,
  })
}

async fn search(config: &EtlConfig, term: &str, limit: usize, json: bool) -> anyhow::Result<()> {
  let fts = config
    .schema
    .fts
    .as_ref()
    .context("no full-text index is configured")?;

  anyhow::ensure!(
    config.database.is_file(),
    "no warehouse at {:?}; run `sdwis-etl ingest` first",
    config.database
  );
  let warehouse = SqliteWarehouse::open_existing(&config.database)
    .await
    .with_context(|| format!("failed to open warehouse at {:?}", config.database))?;
  let hits = warehouse
    .search(fts, term, limit)
    .await
    .context("search failed; has the warehouse been built?")?;

  for hit in &hits {
    if json {
      println!("{}", serde_json::to_string(hit)?);
    } else {
      println!("{}", summary_line(hit, &fts.columns));
    }
  }
  tracing::debug!(hits = hits.len(), %term, "search finished");
  Ok(())
}

/// `pwsid<TAB>indexed columns...`, skipping columns the record lacks.
fn summary_line(record: &Record, columns: &[String]) -> String {
  std::iter::once("pwsid")
    .chain(columns.iter().map(String::as_str))
    .filter_map(|c| record.get(c))
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("\t")
}
