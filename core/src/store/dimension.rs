use super::{AccountRow, TimeRow, TransactionTypeRow, WarehouseStore};
use crate::error::{StoreContext, WarehouseResult};
use rusqlite::params;

impl WarehouseStore {
    // ── Transaction type dimension ─────────────────────────────

    /// Insert any missing labels. Returns how many were new.
    pub fn seed_transaction_types(&self, labels: &[&str]) -> WarehouseResult<usize> {
        let mut stmt = self
            .conn
            .prepare("INSERT OR IGNORE INTO dim_transaction_type (type_name) VALUES (?1)")?;
        let mut inserted = 0;
        for label in labels {
            inserted += stmt
                .execute(params![label])
                .store_context(format!("seeding transaction type {label}"))?;
        }
        Ok(inserted)
    }

    pub fn transaction_types(&self) -> WarehouseResult<Vec<TransactionTypeRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, type_name FROM dim_transaction_type ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TransactionTypeRow {
                    id: row.get(0)?,
                    type_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Time dimension ─────────────────────────────────────────

    /// Add one dim_time row per staging step not already present.
    /// Inserted in ascending step order so surrogate keys follow time.
    pub fn insert_missing_steps(&self) -> WarehouseResult<usize> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO dim_time (step, hour, day)
                 SELECT DISTINCT step, step % 24, step / 24
                 FROM staging_transactions
                 ORDER BY step ASC",
                [],
            )
            .store_context("populating dim_time")
    }

    pub fn time_rows(&self) -> WarehouseResult<Vec<TimeRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, step, hour, day FROM dim_time ORDER BY step ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TimeRow {
                    id: row.get(0)?,
                    step: row.get(1)?,
                    hour: row.get(2)?,
                    day: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Account dimension ──────────────────────────────────────

    /// Add one dim_account row per account id seen as origin or destination.
    pub fn insert_missing_accounts(&self) -> WarehouseResult<usize> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO dim_account (account_id, account_type)
                 SELECT account_id, substr(account_id, 1, 1)
                 FROM (
                     SELECT nameOrig AS account_id FROM staging_transactions
                     UNION
                     SELECT nameDest AS account_id FROM staging_transactions
                 )
                 ORDER BY account_id ASC",
                [],
            )
            .store_context("populating dim_account")
    }

    pub fn account_rows(&self) -> WarehouseResult<Vec<AccountRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, account_type FROM dim_account ORDER BY account_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AccountRow {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    account_type: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
