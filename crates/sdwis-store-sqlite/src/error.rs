//! Error type for `sdwis-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sdwis_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("no such table or view: {0}")]
  UnknownTable(String),

  #[error("table {table} has no column {column}")]
  MissingColumn { table: String, column: String },

  /// A source with a header but no columns cannot become a table.
  #[error("table {0} has no columns")]
  NoColumns(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
