//! Fact population: key resolution, dropped-row reporting, rebuilds.

mod common;

use common::{row, write_source};
use warehouse_core::{
    dimension::DimensionPopulator,
    error::WarehouseError,
    fact::{FactOptions, FactPopulator},
    staging::StagingLoader,
    store::{Dimension, Table, WarehouseStore},
    validation::SchemaValidator,
};

/// Stage `rows` (validating only the first `sample_rows`) and fill both
/// derived dimensions.
fn prepare(store: &WarehouseStore, rows: &[String], sample_rows: usize) {
    StagingLoader::new(store, SchemaValidator::new(sample_rows, b','), b',')
        .load(write_source(rows).path(), 2)
        .expect("staging load");
    let dims = DimensionPopulator::new(store);
    dims.populate_time().unwrap();
    dims.populate_accounts().unwrap();
}

#[test]
fn every_staging_row_becomes_a_fact() {
    let store = common::fresh_store();
    prepare(&store, &common::scenario_rows(), 1000);

    let load = FactPopulator::new(&store, FactOptions::default())
        .populate_facts()
        .unwrap();

    assert_eq!(load.staging_rows, 3);
    assert_eq!(load.inserted, 3);
    assert_eq!(load.unmatched_total, 0);
    assert!(load.unmatched.is_empty());
    assert_eq!(store.row_count(Table::Fact).unwrap(), 3);
}

#[test]
fn origin_and_destination_resolve_independently() {
    let store = common::fresh_store();
    prepare(&store, &common::scenario_rows(), 1000);
    FactPopulator::new(&store, FactOptions::default())
        .populate_facts()
        .unwrap();

    let view = store.warehouse_rows().unwrap();
    let pairs: Vec<(&str, &str, &str, &str)> = view
        .iter()
        .map(|r| {
            (
                r.origin_account.as_str(),
                r.origin_type.as_str(),
                r.destination_account.as_str(),
                r.destination_type.as_str(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("C1", "C", "M1", "M"),
            ("C1", "C", "M1", "M"),
            ("C2", "C", "M2", "M"),
        ]
    );

    let last = &view[2];
    assert_eq!((last.step, last.hour, last.day), (9, 9, 0));
    assert_eq!(last.type_name, "CASH_OUT");
    assert_eq!(last.is_fraud, 1);
    assert_eq!(last.amount, 181.0);
}

#[test]
fn rerun_rebuilds_rather_than_duplicates() {
    let store = common::fresh_store();
    prepare(&store, &common::scenario_rows(), 1000);
    let facts = FactPopulator::new(&store, FactOptions::default());

    facts.populate_facts().unwrap();
    let again = facts.populate_facts().unwrap();

    assert_eq!(again.replaced, 3);
    assert_eq!(again.inserted, 3);
    assert_eq!(store.row_count(Table::Fact).unwrap(), 3);
}

#[test]
fn unknown_type_row_is_dropped_and_reported() {
    let store = common::fresh_store();
    let mut rows = common::scenario_rows();
    // Row 4 sits outside the two-row validation sample.
    rows.push(row(9, "WIRE", "C2", "M2", 0));
    prepare(&store, &rows, 2);

    let load = FactPopulator::new(&store, FactOptions::default())
        .populate_facts()
        .unwrap();

    assert_eq!(load.staging_rows, 4);
    assert_eq!(load.unmatched_total, 1);
    assert_eq!(load.inserted, 3, "facts = staging - dropped");
    assert_eq!(load.unmatched.len(), 1);
    let dropped = &load.unmatched[0];
    assert_eq!(dropped.row_id, 4);
    assert_eq!(dropped.txn_type, "WIRE");
    assert_eq!(dropped.missing, vec![Dimension::TransactionType]);
}

#[test]
fn strict_mode_refuses_to_drop_rows() {
    let store = common::fresh_store();
    let mut rows = common::scenario_rows();
    rows.push(row(9, "WIRE", "C2", "M2", 0));
    prepare(&store, &rows, 2);

    let strict = FactOptions {
        fail_on_unmatched: true,
        ..FactOptions::default()
    };
    let err = FactPopulator::new(&store, strict).populate_facts().unwrap_err();

    assert!(err.is_recoverable());
    match err {
        WarehouseError::UnmatchedStagingRows { count, sample } => {
            assert_eq!(count, 1);
            assert_eq!(sample, vec![4]);
        }
        other => panic!("expected UnmatchedStagingRows, got {other:?}"),
    }
    assert_eq!(store.row_count(Table::Fact).unwrap(), 0);
}

#[test]
fn strict_failure_keeps_previous_facts() {
    let store = common::fresh_store();
    prepare(&store, &common::scenario_rows(), 1000);
    FactPopulator::new(&store, FactOptions::default())
        .populate_facts()
        .unwrap();

    let mut rows = common::scenario_rows();
    rows.push(row(9, "WIRE", "C2", "M2", 0));
    prepare(&store, &rows, 2);
    let strict = FactOptions {
        fail_on_unmatched: true,
        ..FactOptions::default()
    };
    assert!(FactPopulator::new(&store, strict).populate_facts().is_err());

    assert_eq!(store.row_count(Table::Fact).unwrap(), 3);
}

#[test]
fn missing_time_dimension_drops_every_row() {
    let store = common::fresh_store();
    StagingLoader::new(&store, SchemaValidator::new(1000, b','), b',')
        .load(write_source(&common::scenario_rows()).path(), 2)
        .unwrap();
    DimensionPopulator::new(&store).populate_accounts().unwrap();

    let load = FactPopulator::new(&store, FactOptions::default())
        .populate_facts()
        .unwrap();

    assert_eq!(load.inserted, 0);
    assert_eq!(load.unmatched_total, 3);
    assert!(load
        .unmatched
        .iter()
        .all(|r| r.missing == vec![Dimension::Time]));
}

#[test]
fn reported_rows_are_capped() {
    let store = common::fresh_store();
    StagingLoader::new(&store, SchemaValidator::new(1000, b','), b',')
        .load(write_source(&common::scenario_rows()).path(), 2)
        .unwrap();
    DimensionPopulator::new(&store).populate_accounts().unwrap();

    let options = FactOptions {
        fail_on_unmatched: false,
        max_reported_unmatched: 2,
    };
    let load = FactPopulator::new(&store, options).populate_facts().unwrap();

    assert_eq!(load.unmatched_total, 3);
    let ids: Vec<i64> = load.unmatched.iter().map(|r| r.row_id).collect();
    assert_eq!(ids, vec![1, 2]);
}
