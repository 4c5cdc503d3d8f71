//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;
use warehouse_core::{config::WarehouseConfig, schema::SchemaManager, store::WarehouseStore};

pub const HEADER: &str = "step,type,amount,nameOrig,oldbalanceOrg,newbalanceOrig,\
                          nameDest,oldbalanceDest,newbalanceDest,isFraud,isFlaggedFraud";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One well-formed source row.
pub fn row(step: i64, txn_type: &str, orig: &str, dest: &str, fraud: u8) -> String {
    format!("{step},{txn_type},181.0,{orig},181.0,0.0,{dest},0.0,0.0,{fraud},0")
}

/// steps [1,1,9], types [PAYMENT,PAYMENT,CASH_OUT],
/// accounts [(C1,M1),(C1,M1),(C2,M2)].
pub fn scenario_rows() -> Vec<String> {
    vec![
        row(1, "PAYMENT", "C1", "M1", 0),
        row(1, "PAYMENT", "C1", "M1", 0),
        row(9, "CASH_OUT", "C2", "M2", 1),
    ]
}

/// Write `HEADER` followed by `rows` to a temp file.
pub fn write_source(rows: &[String]) -> NamedTempFile {
    write_raw(HEADER, rows)
}

pub fn write_raw(header: &str, rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp source");
    writeln!(file, "{header}").unwrap();
    for r in rows {
        writeln!(file, "{r}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// In-memory store with staging and star schema in place.
pub fn fresh_store() -> WarehouseStore {
    init_logging();
    let store = WarehouseStore::in_memory().expect("in-memory store");
    let schema = SchemaManager::new(&store);
    schema.ensure_star_schema().expect("star schema");
    schema.ensure_staging_table().expect("staging table");
    store
}

pub fn test_config() -> WarehouseConfig {
    WarehouseConfig::default_test()
}
