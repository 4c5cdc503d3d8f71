//! Time and account dimensions, derived from staging.
//!
//! Dedup policy: both dimensions are keyed by a UNIQUE natural key (step,
//! account id) and filled with conflict-ignoring inserts. Rerunning against
//! unchanged staging adds nothing. Rows from earlier runs stay, so keys
//! referenced by facts remain stable across runs.

use crate::{
    error::WarehouseResult,
    store::{Table, WarehouseStore},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionLoad {
    /// Rows added by this call.
    pub inserted: usize,
    /// Rows in the dimension afterwards.
    pub total: i64,
}

pub struct DimensionPopulator<'a> {
    store: &'a WarehouseStore,
}

impl<'a> DimensionPopulator<'a> {
    pub fn new(store: &'a WarehouseStore) -> Self {
        Self { store }
    }

    /// One dim_time row per distinct staging step.
    /// hour = step % 24, day = step / 24.
    pub fn populate_time(&self) -> WarehouseResult<DimensionLoad> {
        log::info!("Inserting unique steps into dim_time...");
        let inserted = self.store.insert_missing_steps()?;
        let total = self.store.row_count(Table::DimTime)?;
        log::info!("dim_time: {inserted} new steps, {total} total");
        Ok(DimensionLoad { inserted, total })
    }

    /// One dim_account row per distinct id seen as origin or destination.
    /// account_type is the id's first character.
    pub fn populate_accounts(&self) -> WarehouseResult<DimensionLoad> {
        log::info!("Inserting unique accounts into dim_account...");
        let inserted = self.store.insert_missing_accounts()?;
        let total = self.store.row_count(Table::DimAccount)?;
        log::info!("dim_account: {inserted} new accounts, {total} total");
        Ok(DimensionLoad { inserted, total })
    }
}
