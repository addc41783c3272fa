//! Error types for `sdwis-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("row {row} has {found} cells, expected {expected}")]
  RaggedRow {
    row:      usize,
    expected: usize,
    found:    usize,
  },

  /// Two or more distinct source headers normalize to the same name.
  #[error("columns {sources:?} all normalize to {canonical:?}")]
  ColumnCollision {
    canonical: String,
    sources:   Vec<String>,
  },

  #[error("invalid identifier {0:?}: must be non-empty lower_snake_case")]
  InvalidIdentifier(String),

  #[error("table {0:?} is declared more than once")]
  DuplicateTable(String),

  #[error("view {0:?} has the same name as a table")]
  ViewCollision(String),

  #[error("invalid column pattern: {0}")]
  Pattern(#[from] regex::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
