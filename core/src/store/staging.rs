use super::{LabelCount, Table, WarehouseStore};
use crate::{
    error::{StoreContext, WarehouseResult},
    types::StagingRecord,
};
use rusqlite::{params, Transaction};

const INSERT_STAGING: &str = "INSERT INTO staging_transactions (
        row_id, step, type, amount, nameOrig, oldbalanceOrg, newbalanceOrig,
        nameDest, oldbalanceDest, newbalanceDest, isFraud, isFlaggedFraud
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

/// An open staging load. Chunks accumulate inside a single transaction;
/// dropping the batch without `commit()` rolls every chunk back.
pub struct StagingBatch<'a> {
    tx: Transaction<'a>,
    rows_written: i64,
}

impl WarehouseStore {
    // ── Staging ────────────────────────────────────────────────

    /// Remove every staging row. Committed immediately.
    pub fn truncate_staging(&self) -> WarehouseResult<usize> {
        self.conn
            .execute("DELETE FROM staging_transactions", [])
            .store_context("truncating staging_transactions")
    }

    pub fn begin_staging_load(&self) -> WarehouseResult<StagingBatch<'_>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .store_context("starting staging load")?;
        Ok(StagingBatch {
            tx,
            rows_written: 0,
        })
    }

    pub fn staging_type_distribution(&self) -> WarehouseResult<Vec<LabelCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT type, COUNT(*) AS count
             FROM staging_transactions
             GROUP BY type
             ORDER BY count DESC, type ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LabelCount {
                    label: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .store_context("grouping staging by type")?;
        Ok(rows)
    }

    pub fn staging_fraud_distribution(&self) -> WarehouseResult<Vec<LabelCount>> {
        self.fraud_distribution(Table::Staging, "isFraud")
    }

    /// Fraud vs. non-fraud counts over `column` of `table`.
    pub(super) fn fraud_distribution(
        &self,
        table: Table,
        column: &'static str,
    ) -> WarehouseResult<Vec<LabelCount>> {
        let sql = format!(
            "SELECT CASE {column} WHEN 1 THEN 'fraudulent' ELSE 'not fraudulent' END AS label,
                    COUNT(*)
             FROM {table}
             GROUP BY label
             ORDER BY label ASC",
            table = table.name(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LabelCount {
                    label: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .store_context(format!("grouping {} by fraud label", table.name()))?;
        Ok(rows)
    }
}

impl StagingBatch<'_> {
    /// Append one chunk. Row ids continue from the previous chunk.
    pub fn insert_chunk(&mut self, chunk: &[StagingRecord]) -> WarehouseResult<usize> {
        let mut stmt = self
            .tx
            .prepare_cached(INSERT_STAGING)
            .store_context("preparing staging insert")?;
        for r in chunk {
            let row_id = self.rows_written + 1;
            stmt.execute(params![
                row_id,
                r.step,
                r.txn_type,
                r.amount,
                r.name_orig,
                r.old_balance_orig,
                r.new_balance_orig,
                r.name_dest,
                r.old_balance_dest,
                r.new_balance_dest,
                r.is_fraud,
                r.is_flagged_fraud,
            ])
            .store_context(format!("inserting staging row {row_id}"))?;
            self.rows_written = row_id;
        }
        Ok(chunk.len())
    }

    pub fn rows_written(&self) -> i64 {
        self.rows_written
    }

    /// Staging row count as seen inside this transaction.
    pub fn row_count(&self) -> WarehouseResult<i64> {
        self.tx
            .query_row("SELECT COUNT(*) FROM staging_transactions", [], |row| {
                row.get(0)
            })
            .store_context("counting staging rows")
    }

    pub fn commit(self) -> WarehouseResult<()> {
        self.tx.commit().store_context("committing staging load")
    }

    pub fn rollback(self) -> WarehouseResult<()> {
        self.tx.rollback().store_context("rolling back staging load")
    }
}
