use super::{Dimension, UnmatchedRow, WarehouseStore};
use crate::error::{StoreContext, WarehouseResult};
use rusqlite::{params, Transaction};

/// Staging rows joined against every dimension, with NULL keys where a
/// lookup fails.
const STAGING_LEFT_JOIN: &str = "FROM staging_transactions st
     LEFT JOIN dim_time dt             ON st.step = dt.step
     LEFT JOIN dim_transaction_type tt ON st.type = tt.type_name
     LEFT JOIN dim_account da_orig     ON st.nameOrig = da_orig.account_id
     LEFT JOIN dim_account da_dest     ON st.nameDest = da_dest.account_id
     WHERE dt.id IS NULL
        OR tt.id IS NULL
        OR da_orig.id IS NULL
        OR da_dest.id IS NULL";

/// An open fact rebuild. Dropping it without `commit()` restores the
/// previous fact table.
pub struct FactRebuild<'a> {
    tx: Transaction<'a>,
}

impl WarehouseStore {
    // ── Fact diagnostics ───────────────────────────────────────

    pub fn unmatched_staging_count(&self) -> WarehouseResult<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) {STAGING_LEFT_JOIN}"), [], |row| {
                row.get(0)
            })
            .store_context("counting unmatched staging rows")
    }

    /// The first `limit` staging rows the fact join would drop, by row id.
    pub fn unmatched_staging_rows(&self, limit: usize) -> WarehouseResult<Vec<UnmatchedRow>> {
        let sql = format!(
            "SELECT st.row_id, st.step, st.type, st.nameOrig, st.nameDest,
                    dt.id IS NULL, tt.id IS NULL, da_orig.id IS NULL, da_dest.id IS NULL
             {STAGING_LEFT_JOIN}
             ORDER BY st.row_id ASC
             LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let flags = [
                    (row.get::<_, bool>(5)?, Dimension::Time),
                    (row.get::<_, bool>(6)?, Dimension::TransactionType),
                    (row.get::<_, bool>(7)?, Dimension::OriginAccount),
                    (row.get::<_, bool>(8)?, Dimension::DestinationAccount),
                ];
                Ok(UnmatchedRow {
                    row_id: row.get(0)?,
                    step: row.get(1)?,
                    txn_type: row.get(2)?,
                    name_orig: row.get(3)?,
                    name_dest: row.get(4)?,
                    missing: flags
                        .into_iter()
                        .filter_map(|(is_missing, dim)| is_missing.then_some(dim))
                        .collect(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .store_context("listing unmatched staging rows")?;
        Ok(rows)
    }

    pub fn begin_fact_rebuild(&self) -> WarehouseResult<FactRebuild<'_>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .store_context("starting fact rebuild")?;
        Ok(FactRebuild { tx })
    }
}

impl FactRebuild<'_> {
    /// Delete every fact row. Returns how many were removed.
    pub fn clear(&self) -> WarehouseResult<usize> {
        self.tx
            .execute("DELETE FROM fact_transactions", [])
            .store_context("clearing fact_transactions")
    }

    /// Insert one fact per staging row whose four keys all resolve.
    pub fn insert_from_staging(&self) -> WarehouseResult<usize> {
        self.tx
            .execute(
                "INSERT INTO fact_transactions (
                     time_key, type_key, origin_account_key, destination_account_key,
                     amount, old_balance_orig, new_balance_orig,
                     old_balance_dest, new_balance_dest, is_fraud, is_flagged_fraud
                 )
                 SELECT dt.id, tt.id, da_orig.id, da_dest.id,
                        st.amount, st.oldbalanceOrg, st.newbalanceOrig,
                        st.oldbalanceDest, st.newbalanceDest, st.isFraud, st.isFlaggedFraud
                 FROM staging_transactions st
                 INNER JOIN dim_time dt             ON st.step = dt.step
                 INNER JOIN dim_transaction_type tt ON st.type = tt.type_name
                 INNER JOIN dim_account da_orig     ON st.nameOrig = da_orig.account_id
                 INNER JOIN dim_account da_dest     ON st.nameDest = da_dest.account_id
                 ORDER BY st.row_id ASC",
                [],
            )
            .store_context("populating fact_transactions")
    }

    pub fn row_count(&self) -> WarehouseResult<i64> {
        self.tx
            .query_row("SELECT COUNT(*) FROM fact_transactions", [], |row| {
                row.get(0)
            })
            .store_context("counting fact rows")
    }

    pub fn commit(self) -> WarehouseResult<()> {
        self.tx.commit().store_context("committing fact rebuild")
    }

    pub fn rollback(self) -> WarehouseResult<()> {
        self.tx.rollback().store_context("rolling back fact rebuild")
    }
}
