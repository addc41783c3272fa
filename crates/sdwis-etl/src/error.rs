//! Error type for `sdwis-etl`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sdwis_core::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("cannot read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{0:?} has no header row")]
  NoHeader(PathBuf),

  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
