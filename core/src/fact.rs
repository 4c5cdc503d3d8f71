//! Fact population: staging joined against every dimension.
//!
//! Each staging row resolves four keys: time by step, type by label, and
//! origin and destination by two independent lookups into dim_account.
//! A row missing any key is excluded from the fact table. Excluded rows
//! are listed up front (one warning per row, up to a cap) and counted, and
//! `fail_on_unmatched` turns any exclusion into a hard error.
//!
//! Facts carry no natural key, so the table is rebuilt from the current
//! staging contents inside one transaction on every run.

use crate::{
    error::{WarehouseError, WarehouseResult},
    store::{Table, UnmatchedRow, WarehouseStore},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactOptions {
    pub fail_on_unmatched: bool,
    pub max_reported_unmatched: usize,
}

impl Default for FactOptions {
    fn default() -> Self {
        Self {
            fail_on_unmatched: false,
            max_reported_unmatched: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactLoad {
    pub staging_rows: i64,
    pub inserted: i64,
    pub replaced: usize,
    pub unmatched_total: i64,
    /// The first `max_reported_unmatched` excluded rows.
    pub unmatched: Vec<UnmatchedRow>,
}

pub struct FactPopulator<'a> {
    store: &'a WarehouseStore,
    options: FactOptions,
}

impl<'a> FactPopulator<'a> {
    pub fn new(store: &'a WarehouseStore, options: FactOptions) -> Self {
        Self { store, options }
    }

    /// Call only after both derived dimensions are populated.
    pub fn populate_facts(&self) -> WarehouseResult<FactLoad> {
        let staging_rows = self.store.row_count(Table::Staging)?;
        let unmatched_total = self.store.unmatched_staging_count()?;
        let unmatched = if unmatched_total > 0 {
            self.report_unmatched(unmatched_total)?
        } else {
            Vec::new()
        };

        if unmatched_total > 0 && self.options.fail_on_unmatched {
            return Err(WarehouseError::UnmatchedStagingRows {
                count: unmatched_total,
                sample: unmatched.iter().map(|r| r.row_id).collect(),
            });
        }

        log::info!("Inserting data into fact_transactions...");
        let rebuild = self.store.begin_fact_rebuild()?;
        let replaced = rebuild.clear()?;
        rebuild.insert_from_staging()?;
        let inserted = rebuild.row_count()?;

        let expected = staging_rows - unmatched_total;
        if inserted != expected {
            log::error!("Expected {expected} fact rows, but got {inserted}");
            if let Err(e) = rebuild.rollback() {
                log::error!("Fact rollback failed: {e}");
            }
            return Err(WarehouseError::CountMismatch {
                table: Table::Fact.name().to_string(),
                expected,
                actual: inserted,
            });
        }
        rebuild.commit()?;

        log::info!(
            "Fact transactions inserted: {inserted} of {staging_rows} staging rows \
             ({replaced} previous facts replaced)"
        );
        Ok(FactLoad {
            staging_rows,
            inserted,
            replaced,
            unmatched_total,
            unmatched,
        })
    }

    fn report_unmatched(&self, total: i64) -> WarehouseResult<Vec<UnmatchedRow>> {
        let rows = self
            .store
            .unmatched_staging_rows(self.options.max_reported_unmatched)?;
        log::warn!("{total} staging rows have no matching dimension key and will be dropped");
        for r in &rows {
            log::warn!(
                "  staging row {} (step={}, type={}, origin={}, destination={}): missing {:?}",
                r.row_id,
                r.step,
                r.txn_type,
                r.name_orig,
                r.name_dest,
                r.missing
            );
        }
        if (rows.len() as i64) < total {
            log::warn!("  ... and {} more", total - rows.len() as i64);
        }
        Ok(rows)
    }
}
