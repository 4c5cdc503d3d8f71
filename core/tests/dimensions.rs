//! Time and account dimension tests.

mod common;

use common::{row, write_source};
use warehouse_core::{
    dimension::DimensionPopulator,
    staging::StagingLoader,
    store::WarehouseStore,
    validation::SchemaValidator,
};

fn stage(store: &WarehouseStore, rows: &[String]) {
    StagingLoader::new(store, SchemaValidator::new(1000, b','), b',')
        .load(write_source(rows).path(), 2)
        .expect("staging load");
}

#[test]
fn one_time_row_per_distinct_step() {
    let store = common::fresh_store();
    stage(&store, &[
        row(50, "PAYMENT", "C1", "M1", 0),
        row(1, "PAYMENT", "C1", "M1", 0),
        row(1, "PAYMENT", "C2", "M1", 0),
        row(24, "DEBIT", "C3", "M2", 0),
        row(9, "CASH_OUT", "C2", "M2", 0),
    ]);

    let load = DimensionPopulator::new(&store).populate_time().unwrap();
    assert_eq!(load.inserted, 4);
    assert_eq!(load.total, 4);

    let rows: Vec<(i64, i64, i64)> = store
        .time_rows()
        .unwrap()
        .into_iter()
        .map(|r| (r.step, r.hour, r.day))
        .collect();
    assert_eq!(rows, vec![(1, 1, 0), (9, 9, 0), (24, 0, 1), (50, 2, 2)]);
}

#[test]
fn time_keys_follow_step_order() {
    let store = common::fresh_store();
    stage(&store, &[
        row(30, "PAYMENT", "C1", "M1", 0),
        row(2, "PAYMENT", "C1", "M1", 0),
        row(17, "PAYMENT", "C1", "M1", 0),
    ]);
    DimensionPopulator::new(&store).populate_time().unwrap();

    let ids: Vec<i64> = store.time_rows().unwrap().iter().map(|r| r.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "rows are listed by step; keys must ascend with it");
}

#[test]
fn accounts_are_the_union_of_both_roles() {
    let store = common::fresh_store();
    stage(&store, &[
        row(1, "TRANSFER", "C1", "C2", 0),
        row(2, "PAYMENT", "C2", "M1", 0),
        row(3, "PAYMENT", "C3", "M1", 0),
    ]);

    let load = DimensionPopulator::new(&store).populate_accounts().unwrap();
    assert_eq!(load.inserted, 4);

    let accounts: Vec<(String, String)> = store
        .account_rows()
        .unwrap()
        .into_iter()
        .map(|a| (a.account_id, a.account_type))
        .collect();
    assert_eq!(
        accounts,
        vec![
            ("C1".into(), "C".into()),
            ("C2".into(), "C".into()),
            ("C3".into(), "C".into()),
            ("M1".into(), "M".into()),
        ],
        "C2 appears as both destination and origin but only once here"
    );
}

#[test]
fn rerun_without_truncate_adds_nothing() {
    let store = common::fresh_store();
    stage(&store, &common::scenario_rows());
    let dims = DimensionPopulator::new(&store);

    let time_first = dims.populate_time().unwrap();
    let acct_first = dims.populate_accounts().unwrap();
    let time_again = dims.populate_time().unwrap();
    let acct_again = dims.populate_accounts().unwrap();

    assert_eq!(time_again.inserted, 0);
    assert_eq!(acct_again.inserted, 0);
    assert_eq!(time_again.total, time_first.total);
    assert_eq!(acct_again.total, acct_first.total);
}

#[test]
fn dimensions_accumulate_across_sources() {
    let store = common::fresh_store();
    let dims = DimensionPopulator::new(&store);

    stage(&store, &[row(1, "PAYMENT", "C1", "M1", 0)]);
    dims.populate_time().unwrap();
    dims.populate_accounts().unwrap();
    let c1_key = store.account_rows().unwrap()[0].id;

    stage(&store, &[row(2, "PAYMENT", "C1", "M2", 0)]);
    let time = dims.populate_time().unwrap();
    let accounts = dims.populate_accounts().unwrap();

    assert_eq!((time.inserted, time.total), (1, 2));
    assert_eq!((accounts.inserted, accounts.total), (1, 3));
    assert_eq!(store.account_rows().unwrap()[0].id, c1_key, "existing keys stay put");
}
