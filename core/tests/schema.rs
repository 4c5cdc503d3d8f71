//! Schema lifecycle tests.

mod common;

use warehouse_core::{
    error::WarehouseError,
    schema::SchemaManager,
    store::{Table, WarehouseStore},
};

#[test]
fn star_schema_creates_every_table_and_seeds_types() {
    common::init_logging();
    let store = WarehouseStore::in_memory().unwrap();
    SchemaManager::new(&store).ensure_star_schema().unwrap();

    for table in Table::STAR_SCHEMA {
        assert!(store.table_exists(table).unwrap(), "{} missing", table.name());
    }
    let types: Vec<String> = store
        .transaction_types()
        .unwrap()
        .into_iter()
        .map(|t| t.type_name)
        .collect();
    assert_eq!(types, vec!["CASH_IN", "CASH_OUT", "DEBIT", "PAYMENT", "TRANSFER"]);
}

#[test]
fn staging_table_is_separate_from_star_schema() {
    let store = WarehouseStore::in_memory().unwrap();
    let schema = SchemaManager::new(&store);

    schema.ensure_star_schema().unwrap();
    assert!(!store.table_exists(Table::Staging).unwrap());

    schema.ensure_staging_table().unwrap();
    assert!(store.table_exists(Table::Staging).unwrap());
}

#[test]
fn repeated_creation_is_a_no_op() {
    let store = common::fresh_store();
    let schema = SchemaManager::new(&store);
    let before = store.transaction_types().unwrap();

    schema.ensure_star_schema().unwrap();
    schema.ensure_staging_table().unwrap();
    schema.ensure_star_schema().unwrap();

    assert_eq!(store.transaction_types().unwrap(), before,
        "type dimension must be seeded once, with stable keys");
    assert_eq!(store.row_count(Table::DimTransactionType).unwrap(), 5);
}

#[test]
fn table_shadowed_by_a_view_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warehouse.db");
    let path = path.to_str().unwrap();

    // A view with the same name makes CREATE TABLE IF NOT EXISTS a no-op.
    let raw = rusqlite::Connection::open(path).unwrap();
    raw.execute_batch("CREATE VIEW dim_time AS SELECT 1 AS id;").unwrap();
    drop(raw);

    let store = WarehouseStore::open(path).unwrap();
    let err = SchemaManager::new(&store).ensure_star_schema().unwrap_err();
    assert!(!err.is_recoverable(), "schema failures are fatal");
    match err {
        WarehouseError::SchemaCreation { table } => assert_eq!(table, "dim_time"),
        other => panic!("expected SchemaCreation, got {other:?}"),
    }
}

#[test]
fn connection_check_reports_version() {
    let store = WarehouseStore::in_memory().unwrap();
    let version = store.verify_connection().unwrap();
    assert!(version.starts_with('3'), "unexpected SQLite version {version}");
}
