//! Core types and trait definitions for the SDWIS loader.
//!
//! This crate is deliberately free of database and file-format dependencies.
//! It owns the naming convention, the coercion rules, the schema
//! configuration and the [`Warehouse`](store::Warehouse) abstraction that
//! storage backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod coerce;
pub mod error;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod store;
pub mod value;

pub use error::{Error, Result};
