//! Offline loader for SDWIS drinking-water extracts.
//!
//! Reads a directory of `SDWA_*.csv` files, normalizes and coerces every
//! column, and rebuilds a [`Warehouse`](sdwis_core::store::Warehouse) from
//! scratch: one table per file, secondary indexes, a full-text index over
//! system names and the legacy views older queries expect.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;

pub use config::EtlConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
