//! Connection setup and the fixed SQL fragments used by the warehouse.
//!
//! Unlike an application store there is no fixed DDL: every table is shaped
//! by its source file. Only connection pragmas and catalog queries live here.

/// Executed once when a connection is opened.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
";

/// Tables and views, by name.
pub const OBJECT_EXISTS: &str =
  "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1";
