//! Integration tests for `SqliteWarehouse` against an in-memory database.

use sdwis_core::{
  coerce::ColumnKind,
  schema::{FtsSpec, IndexSpec, ViewSpec},
  store::Warehouse,
  value::{Column, Table, Value},
};

use crate::{Error, SqliteWarehouse};

async fn warehouse() -> SqliteWarehouse {
  SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse")
}

fn text(s: &str) -> Value { Value::Text(s.into()) }

fn col(name: &str, kind: ColumnKind) -> Column {
  Column {
    name: name.into(),
    kind,
  }
}

fn systems(rows: &[(&str, &str, &str, Value)]) -> Table {
  let mut t = Table::new(
    "pub_water_systems",
    vec![
      col("submissionyearquarter", ColumnKind::Text),
      col("pwsid", ColumnKind::Text),
      col("pws_name", ColumnKind::Text),
      col("population_served_count", ColumnKind::Numeric),
    ],
  );
  for (period, id, name, pop) in rows {
    t.push_row(vec![text(period), text(id), text(name), pop.clone()])
      .unwrap();
  }
  t
}

fn key() -> Option<Vec<String>> {
  Some(vec!["submissionyearquarter".into(), "pwsid".into()])
}

fn name_fts() -> FtsSpec {
  FtsSpec {
    table:   "pub_water_systems".into(),
    columns: vec!["pws_name".into()],
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_table_stores_rows_and_types() {
  let w = warehouse().await;
  let t = systems(&[
    ("2025Q1", "GA0010000", "CITY OF ATLANTA", Value::Integer(500000)),
    ("2025Q1", "GA0020000", "MACON WATER AUTHORITY", Value::Null),
  ]);

  let stored = w.replace_table(t, key()).await.unwrap();
  assert_eq!(stored, 2);
  assert!(w.table_exists("pub_water_systems").await.unwrap());
  assert_eq!(
    w.table_columns("pub_water_systems").await.unwrap(),
    vec!["submissionyearquarter", "pwsid", "pws_name", "population_served_count"]
  );

  let rows = w.scan("pub_water_systems").await.unwrap();
  assert_eq!(rows[0].get("population_served_count"), Some(&Value::Integer(500000)));
  assert_eq!(rows[1].get("population_served_count"), Some(&Value::Null));
}

#[tokio::test]
async fn replace_discards_previous_contents() {
  let w = warehouse().await;
  w.replace_table(
    systems(&[
      ("2024Q4", "GA0010000", "OLD NAME", Value::Integer(1)),
      ("2024Q4", "GA0030000", "GONE", Value::Integer(2)),
    ]),
    key(),
  )
  .await
  .unwrap();

  w.replace_table(
    systems(&[("2025Q1", "GA0010000", "NEW NAME", Value::Integer(3))]),
    key(),
  )
  .await
  .unwrap();

  let rows = w.scan("pub_water_systems").await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].get("pws_name"), Some(&text("NEW NAME")));
}

#[tokio::test]
async fn duplicate_keys_are_last_write_wins() {
  let w = warehouse().await;
  let t = systems(&[
    ("2025Q1", "GA0010000", "FIRST", Value::Integer(1)),
    ("2025Q1", "GA0010000", "SECOND", Value::Integer(2)),
    ("2025Q1", "GA0020000", "OTHER", Value::Integer(3)),
  ]);

  let stored = w.replace_table(t, key()).await.unwrap();
  assert_eq!(stored, 2);

  let rows = w.scan("pub_water_systems").await.unwrap();
  let names: Vec<_> = rows.iter().filter_map(|r| r.get("pws_name")).collect();
  assert!(names.contains(&&text("SECOND")));
  assert!(!names.contains(&&text("FIRST")));
}

#[tokio::test]
async fn unkeyed_tables_keep_duplicates() {
  let w = warehouse().await;
  let t = systems(&[
    ("2025Q1", "GA0010000", "A", Value::Null),
    ("2025Q1", "GA0010000", "A", Value::Null),
  ]);
  assert_eq!(w.replace_table(t, None).await.unwrap(), 2);
}

#[tokio::test]
async fn key_column_must_exist() {
  let w = warehouse().await;
  let t = systems(&[]);
  let err = w
    .replace_table(t, Some(vec!["geo_id".into()]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingColumn { column, .. } if column == "geo_id"));
  assert!(!w.table_exists("pub_water_systems").await.unwrap());
}

#[tokio::test]
async fn row_count_of_unknown_table_is_an_error() {
  let w = warehouse().await;
  let err = w.row_count("facilities").await.unwrap_err();
  assert!(matches!(err, Error::UnknownTable(t) if t == "facilities"));
  assert!(w.table_columns("facilities").await.unwrap().is_empty());
}

// ─── Indexes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn creates_indexes_idempotently() {
  let w = warehouse().await;
  w.replace_table(systems(&[]), key()).await.unwrap();

  let spec = IndexSpec {
    table:   "pub_water_systems".into(),
    columns: vec!["pwsid".into()],
  };
  assert_eq!(w.create_index(&spec).await.unwrap(), "idx_pub_water_systems_pwsid");
  assert_eq!(w.create_index(&spec).await.unwrap(), "idx_pub_water_systems_pwsid");

  let missing = IndexSpec {
    table:   "pub_water_systems".into(),
    columns: vec!["county_served".into()],
  };
  assert!(matches!(
    w.create_index(&missing).await.unwrap_err(),
    Error::MissingColumn { .. }
  ));
}

// ─── Full-text search ────────────────────────────────────────────────────────

#[tokio::test]
async fn full_text_search_finds_matching_systems() {
  let w = warehouse().await;
  w.replace_table(
    systems(&[
      ("2025Q1", "GA0010000", "CITY OF ATLANTA", Value::Integer(500000)),
      ("2025Q1", "GA0020000", "MACON WATER AUTHORITY", Value::Integer(100000)),
      ("2025Q1", "GA0030000", "ATLANTA HEIGHTS MHP", Value::Integer(120)),
      ("2025Q1", "GA0040000", "SAVANNAH", Value::Integer(140000)),
    ]),
    key(),
  )
  .await
  .unwrap();
  w.enable_fts(&name_fts()).await.unwrap();

  let hits = w.search(&name_fts(), "atlanta", 10).await.unwrap();
  let ids: Vec<_> = hits.iter().filter_map(|r| r.get("pwsid")).collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&&text("GA0010000")));
  assert!(ids.contains(&&text("GA0030000")));

  let hits = w.search(&name_fts(), "macon authority", 10).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].get("pwsid"), Some(&text("GA0020000")));

  assert_eq!(w.search(&name_fts(), "atlanta", 1).await.unwrap().len(), 1);
  assert!(w.search(&name_fts(), "augusta", 10).await.unwrap().is_empty());
  assert!(w.search(&name_fts(), "   ", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_tolerates_query_syntax_in_terms() {
  let w = warehouse().await;
  w.replace_table(
    systems(&[("2025Q1", "GA0010000", "O'NEIL \"LAKE\" PARK", Value::Null)]),
    key(),
  )
  .await
  .unwrap();
  w.enable_fts(&name_fts()).await.unwrap();

  for term in ["\"lake\"", "AND", "park*", "o'neil"] {
    assert!(w.search(&name_fts(), term, 10).await.is_ok(), "term {term:?}");
  }
}

#[tokio::test]
async fn fts_is_rebuilt_after_reload() {
  let w = warehouse().await;
  w.replace_table(systems(&[("2025Q1", "A", "ALPHA", Value::Null)]), key())
    .await
    .unwrap();
  w.enable_fts(&name_fts()).await.unwrap();

  w.replace_table(systems(&[("2025Q1", "B", "BRAVO", Value::Null)]), key())
    .await
    .unwrap();
  w.enable_fts(&name_fts()).await.unwrap();

  assert!(w.search(&name_fts(), "alpha", 10).await.unwrap().is_empty());
  assert_eq!(w.search(&name_fts(), "bravo", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_without_fts_table_is_an_error() {
  let w = warehouse().await;
  let err = w.search(&name_fts(), "atlanta", 10).await.unwrap_err();
  assert!(matches!(err, Error::UnknownTable(t) if t == "pub_water_systems_fts"));
}

#[tokio::test]
async fn dropped_fts_is_no_longer_searchable() {
  let w = warehouse().await;
  w.replace_table(systems(&[("2025Q1", "A", "ALPHA WATER", Value::Null)]), key())
    .await
    .unwrap();
  w.enable_fts(&name_fts()).await.unwrap();

  w.drop_fts(&name_fts()).await.unwrap();
  w.drop_fts(&name_fts()).await.unwrap();

  assert!(!w.table_exists("pub_water_systems_fts").await.unwrap());
  assert!(matches!(
    w.search(&name_fts(), "water", 10).await.unwrap_err(),
    Error::UnknownTable(_)
  ));
  assert_eq!(w.row_count("pub_water_systems").await.unwrap(), 1);
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn legacy_view_mirrors_table() {
  let w = warehouse().await;
  w.replace_table(
    systems(&[
      ("2025Q1", "GA0010000", "CITY OF ATLANTA", Value::Integer(500000)),
      ("2025Q1", "GA0020000", "MACON WATER AUTHORITY", Value::Real(1.5)),
    ]),
    key(),
  )
  .await
  .unwrap();

  let view = ViewSpec {
    name:  "water_systems".into(),
    table: "pub_water_systems".into(),
  };
  w.create_view(&view).await.unwrap();
  w.create_view(&view).await.unwrap();

  assert_eq!(
    w.scan("water_systems").await.unwrap(),
    w.scan("pub_water_systems").await.unwrap()
  );
  assert_eq!(w.row_count("water_systems").await.unwrap(), 2);
}

#[tokio::test]
async fn view_over_missing_table_is_an_error() {
  let w = warehouse().await;
  let view = ViewSpec {
    name:  "violations".into(),
    table: "violations_enforcement".into(),
  };
  assert!(matches!(
    w.create_view(&view).await.unwrap_err(),
    Error::UnknownTable(_)
  ));
}

// ─── Files ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_backed_warehouse_persists() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("georgia_water.db");

  {
    let w = SqliteWarehouse::open(&path).await.unwrap();
    w.replace_table(systems(&[("2025Q1", "GA0010000", "X", Value::Null)]), key())
      .await
      .unwrap();
  }

  let w = SqliteWarehouse::open_existing(&path).await.unwrap();
  assert_eq!(w.row_count("pub_water_systems").await.unwrap(), 1);
}

#[tokio::test]
async fn open_existing_does_not_create_a_database() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("absent.db");

  let err = SqliteWarehouse::open_existing(&path).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)));
  assert!(!path.exists());
}
