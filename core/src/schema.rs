//! Schema lifecycle: creates staging and star-schema tables.
//!
//! Every call is create-if-absent and safe to repeat. After the DDL runs,
//! each expected table is looked up again; a table that is still missing
//! fails the call with SchemaCreation naming it.

use crate::{
    error::{WarehouseError, WarehouseResult},
    store::{Table, WarehouseStore},
    types::TransactionType,
};

pub struct SchemaManager<'a> {
    store: &'a WarehouseStore,
}

impl<'a> SchemaManager<'a> {
    pub fn new(store: &'a WarehouseStore) -> Self {
        Self { store }
    }

    /// Create the three dimensions and the fact table, and seed the
    /// transaction-type dimension with the five known labels.
    pub fn ensure_star_schema(&self) -> WarehouseResult<()> {
        log::info!("Creating star schema...");
        self.store.apply_star_schema()?;
        self.verify_tables(&Table::STAR_SCHEMA)?;

        let labels: Vec<&str> = TransactionType::ALL.iter().map(|t| t.as_str()).collect();
        let seeded = self.store.seed_transaction_types(&labels)?;
        if seeded > 0 {
            log::info!("Seeded {seeded} transaction types");
        }
        log::info!("Star schema ready");
        Ok(())
    }

    pub fn ensure_staging_table(&self) -> WarehouseResult<()> {
        log::info!("Creating staging table...");
        self.store.apply_staging_schema()?;
        self.verify_tables(&[Table::Staging])?;
        log::info!("Staging table ready");
        Ok(())
    }

    /// The run ledger is bookkeeping, not part of the warehouse proper.
    pub fn ensure_run_ledger(&self) -> WarehouseResult<()> {
        self.store.apply_run_ledger_schema()?;
        self.verify_tables(&[Table::EtlRun])
    }

    fn verify_tables(&self, expected: &[Table]) -> WarehouseResult<()> {
        for table in expected {
            if !self.store.table_exists(*table)? {
                log::error!("Table {} was not created", table.name());
                return Err(WarehouseError::SchemaCreation {
                    table: table.name().to_string(),
                });
            }
        }
        Ok(())
    }
}
