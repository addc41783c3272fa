//! The `Warehouse` trait.
//!
//! Implemented by storage backends (e.g. `sdwis-store-sqlite`). The loader
//! pipeline depends on this abstraction, not on any concrete database.

use std::future::Future;

use crate::{
  schema::{FtsSpec, IndexSpec, ViewSpec},
  value::{Record, Table},
};

/// Destination of a load run and source of read queries against it.
///
/// There is exactly one writer. Every table write is a whole-table replace;
/// nothing is ever appended to or updated in place.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tables ────────────────────────────────────────────────────────────

  /// Drop `table` (if present) and recreate it from `table`'s rows.
  ///
  /// With a primary key, rows sharing a key overwrite one another in file
  /// order (last write wins). Returns the number of rows stored.
  fn replace_table(
    &self,
    table: Table,
    primary_key: Option<Vec<String>>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn table_exists<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Column names in declaration order; empty if the table does not exist.
  fn table_columns<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Row count of a table or view.
  fn row_count<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Derived structures ────────────────────────────────────────────────

  /// Create a secondary index if it does not exist; returns its name.
  fn create_index<'a>(
    &'a self,
    spec: &'a IndexSpec,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Rebuild the full-text table for `spec` from its content table.
  fn enable_fts<'a>(
    &'a self,
    spec: &'a FtsSpec,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Drop the full-text table for `spec`, if any. Used when it can no
  /// longer be rebuilt, so searches never join stale rowids onto new rows.
  fn drop_fts<'a>(
    &'a self,
    spec: &'a FtsSpec,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Drop and recreate a view aliasing `spec.table`.
  fn create_view<'a>(
    &'a self,
    spec: &'a ViewSpec,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Full-text search over the columns of `spec`, best match first.
  fn search<'a>(
    &'a self,
    spec: &'a FtsSpec,
    term: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// Every row of a table or view, in storage order.
  fn scan<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;
}
