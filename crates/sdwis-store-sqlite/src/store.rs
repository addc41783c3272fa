//! [`SqliteWarehouse`]: the SQLite implementation of [`Warehouse`].

use std::path::Path;

use rusqlite::{OpenFlags, OptionalExtension as _};
use sdwis_core::{
  schema::{FtsSpec, IndexSpec, ViewSpec},
  store::Warehouse,
  value::{Record, Table},
};

use crate::{
  Error, Result,
  encode::{
    create_index_sql, create_table_sql, create_view_sql, decode_value, drop_table_sql,
    encode_value, fts_query, insert_sql, quote_ident, rebuild_fts_sql, search_sql,
  },
  schema::{OBJECT_EXISTS, PRAGMAS},
};

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// A warehouse backed by a single SQLite file.
///
/// Cloning shares the underlying connection.
#[derive(Clone, Debug)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let warehouse = Self { conn };
    warehouse.init().await?;
    Ok(warehouse)
  }

  /// Open a warehouse that must already exist at `path`; never creates one.
  pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
      | OpenFlags::SQLITE_OPEN_URI
      | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = tokio_rusqlite::Connection::open_with_flags(path, flags).await?;
    let warehouse = Self { conn };
    warehouse.init().await?;
    Ok(warehouse)
  }

  /// Open an in-memory warehouse.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let warehouse = Self { conn };
    warehouse.init().await?;
    Ok(warehouse)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn require_object(&self, name: &str) -> Result<()> {
    if self.table_exists(name).await? {
      Ok(())
    } else {
      Err(Error::UnknownTable(name.to_owned()))
    }
  }

  async fn require_columns(&self, table: &str, columns: &[String]) -> Result<()> {
    let present = self.table_columns(table).await?;
    if present.is_empty() {
      return Err(Error::UnknownTable(table.to_owned()));
    }
    match columns.iter().find(|c| !present.contains(c)) {
      Some(column) => Err(Error::MissingColumn {
        table:  table.to_owned(),
        column: column.clone(),
      }),
      None => Ok(()),
    }
  }
}

/// Run `sql` and collect every row as a [`Record`].
fn query_records(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Record>> {
  let mut stmt = conn.prepare(sql)?;
  let names: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();

  let mut rows = stmt.query(params)?;
  let mut out = Vec::new();
  while let Some(row) = rows.next()? {
    let mut fields = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
      fields.push((name.clone(), decode_value(row.get_ref(i)?)));
    }
    out.push(Record { fields });
  }
  Ok(out)
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = Error;

  // ── Tables ────────────────────────────────────────────────────────────────

  async fn replace_table(&self, table: Table, primary_key: Option<Vec<String>>) -> Result<u64> {
    if table.columns().is_empty() {
      return Err(Error::NoColumns(table.name().to_owned()));
    }
    if let Some(key) = &primary_key
      && let Some(column) = key.iter().find(|c| table.column_index(c).is_none())
    {
      return Err(Error::MissingColumn {
        table:  table.name().to_owned(),
        column: column.clone(),
      });
    }

    let drop_sql   = drop_table_sql(table.name());
    let create_sql = create_table_sql(&table, primary_key.as_deref());
    let insert     = insert_sql(&table);
    let count_sql  = format!("SELECT COUNT(*) FROM {}", quote_ident(table.name()));

    let stored: i64 = self
      .conn
      .call(move |conn| {
        // Dropping and refilling in one transaction leaves the previous
        // contents in place if anything below fails.
        let tx = conn.transaction()?;
        tx.execute(&drop_sql, [])?;
        tx.execute(&create_sql, [])?;
        {
          let mut stmt = tx.prepare(&insert)?;
          for row in table.rows() {
            stmt.execute(rusqlite::params_from_iter(row.iter().map(encode_value)))?;
          }
        }
        let stored = tx.query_row(&count_sql, [], |r| r.get(0))?;
        tx.commit()?;
        Ok(stored)
      })
      .await?;

    Ok(stored.max(0) as u64)
  }

  async fn table_exists(&self, name: &str) -> Result<bool> {
    let name = name.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(OBJECT_EXISTS, rusqlite::params![name], |_| Ok(true))
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn table_columns(&self, name: &str) -> Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(name));
    let columns = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let columns = stmt
          .query_map([], |row| row.get::<_, String>(1))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
      })
      .await?;
    Ok(columns)
  }

  async fn row_count(&self, name: &str) -> Result<u64> {
    self.require_object(name).await?;
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(name));
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;
    Ok(count.max(0) as u64)
  }

  // ── Derived structures ────────────────────────────────────────────────────

  async fn create_index(&self, spec: &IndexSpec) -> Result<String> {
    self.require_columns(&spec.table, &spec.columns).await?;

    let name = spec.name();
    let sql = create_index_sql(&name, &spec.table, &spec.columns);
    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, [])?;
        Ok(())
      })
      .await?;

    tracing::debug!(index = %name, table = %spec.table, "index created");
    Ok(name)
  }

  async fn enable_fts(&self, spec: &FtsSpec) -> Result<()> {
    self.require_columns(&spec.table, &spec.columns).await?;

    let sql = rebuild_fts_sql(&spec.fts_table(), &spec.table, &spec.columns);
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(fts = %spec.fts_table(), "full-text index rebuilt");
    Ok(())
  }

  async fn drop_fts(&self, spec: &FtsSpec) -> Result<()> {
    let sql = drop_table_sql(&spec.fts_table());
    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, [])?;
        Ok(())
      })
      .await?;

    tracing::debug!(fts = %spec.fts_table(), "full-text index dropped");
    Ok(())
  }

  async fn create_view(&self, spec: &ViewSpec) -> Result<()> {
    self.require_object(&spec.table).await?;

    let sql = create_view_sql(&spec.name, &spec.table);
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn search(&self, spec: &FtsSpec, term: &str, limit: usize) -> Result<Vec<Record>> {
    let fts_table = spec.fts_table();
    self.require_object(&fts_table).await?;

    let Some(query) = fts_query(term) else {
      return Ok(Vec::new());
    };
    let sql = search_sql(&fts_table, &spec.table);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let records = self
      .conn
      .call(move |conn| Ok(query_records(conn, &sql, rusqlite::params![query, limit])?))
      .await?;
    Ok(records)
  }

  async fn scan(&self, name: &str) -> Result<Vec<Record>> {
    self.require_object(name).await?;
    let sql = format!("SELECT * FROM {}", quote_ident(name));
    let records = self
      .conn
      .call(move |conn| Ok(query_records(conn, &sql, [])?))
      .await?;
    Ok(records)
  }
}
