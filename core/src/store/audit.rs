use super::{LabelCount, Table, WarehouseRow, WarehouseStore};
use crate::error::{StoreContext, WarehouseResult};

impl WarehouseStore {
    // ── Integrity ──────────────────────────────────────────────

    /// Fact rows with at least one foreign key that does not resolve.
    pub fn orphaned_fact_count(&self) -> WarehouseResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*)
                 FROM fact_transactions ft
                 LEFT JOIN dim_time dt             ON ft.time_key = dt.id
                 LEFT JOIN dim_transaction_type tt ON ft.type_key = tt.id
                 LEFT JOIN dim_account da_orig     ON ft.origin_account_key = da_orig.id
                 LEFT JOIN dim_account da_dest     ON ft.destination_account_key = da_dest.id
                 WHERE dt.id IS NULL
                    OR tt.id IS NULL
                    OR da_orig.id IS NULL
                    OR da_dest.id IS NULL",
                [],
                |row| row.get(0),
            )
            .store_context("counting orphaned fact rows")
    }

    pub fn fact_fraud_distribution(&self) -> WarehouseResult<Vec<LabelCount>> {
        self.fraud_distribution(Table::Fact, "is_fraud")
    }

    // ── Warehouse view ─────────────────────────────────────────

    /// Stream the five-way join in fact order. Stops at the first error
    /// returned by `f`.
    pub fn for_each_warehouse_row<F>(&self, mut f: F) -> WarehouseResult<u64>
    where
        F: FnMut(WarehouseRow) -> WarehouseResult<()>,
    {
        let mut stmt = self.conn.prepare(
            "SELECT dt.step, dt.hour, dt.day,
                    tt.type_name,
                    da_orig.account_id, da_orig.account_type,
                    da_dest.account_id, da_dest.account_type,
                    ft.amount,
                    ft.old_balance_orig, ft.new_balance_orig,
                    ft.old_balance_dest, ft.new_balance_dest,
                    ft.is_fraud, ft.is_flagged_fraud
             FROM fact_transactions ft
             INNER JOIN dim_time dt             ON ft.time_key = dt.id
             INNER JOIN dim_transaction_type tt ON ft.type_key = tt.id
             INNER JOIN dim_account da_orig     ON ft.origin_account_key = da_orig.id
             INNER JOIN dim_account da_dest     ON ft.destination_account_key = da_dest.id
             ORDER BY ft.id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WarehouseRow {
                step: row.get(0)?,
                hour: row.get(1)?,
                day: row.get(2)?,
                type_name: row.get(3)?,
                origin_account: row.get(4)?,
                origin_type: row.get(5)?,
                destination_account: row.get(6)?,
                destination_type: row.get(7)?,
                amount: row.get(8)?,
                old_balance_orig: row.get(9)?,
                new_balance_orig: row.get(10)?,
                old_balance_dest: row.get(11)?,
                new_balance_dest: row.get(12)?,
                is_fraud: row.get(13)?,
                is_flagged_fraud: row.get(14)?,
            })
        })?;

        let mut seen = 0u64;
        for row in rows {
            f(row.store_context("reading warehouse view")?)?;
            seen += 1;
        }
        Ok(seen)
    }

    /// The whole warehouse view in memory. Fine for tests and small runs.
    pub fn warehouse_rows(&self) -> WarehouseResult<Vec<WarehouseRow>> {
        let mut out = Vec::new();
        self.for_each_warehouse_row(|row| {
            out.push(row);
            Ok(())
        })?;
        Ok(out)
    }
}
