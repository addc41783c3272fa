//! Loader configuration.
//!
//! Built-in defaults describe the Georgia SDWIS drop. An optional TOML file
//! and `SDWIS_`-prefixed environment variables are layered on top with the
//! `config` crate, in that order; command-line flags win over both.

use std::path::{Path, PathBuf};

use sdwis_core::schema::SchemaConfig;
use serde::Deserialize;

use crate::Result;

pub const DEFAULT_SOURCE_DIR: &str = "data";
pub const DEFAULT_DATABASE: &str = "georgia_water.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
  /// Directory holding the `SDWA_*.csv` extracts.
  pub source_dir: PathBuf,
  /// SQLite file to (re)build.
  pub database:   PathBuf,
  pub schema:     SchemaConfig,
}

impl Default for EtlConfig {
  fn default() -> Self {
    Self {
      source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
      database:   PathBuf::from(DEFAULT_DATABASE),
      schema:     SchemaConfig::default(),
    }
  }
}

impl EtlConfig {
  /// Layer `file` (if given and present) and the environment over the
  /// defaults, then validate the schema section.
  pub fn load(file: Option<&Path>) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = file {
      builder = builder.add_source(config::File::from(path).required(false));
    }
    let settings = builder
      .add_source(
        config::Environment::with_prefix("SDWIS")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?;

    let config: EtlConfig = settings.try_deserialize()?;
    config.schema.validate()?;
    Ok(config)
  }
}
