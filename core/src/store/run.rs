use super::{RunRow, WarehouseStore};
use crate::error::{StoreContext, WarehouseResult};
use rusqlite::{params, OptionalExtension};

impl WarehouseStore {
    // ── Run ledger ─────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        source_path: &str,
        started_at: &str,
        stage: &str,
    ) -> WarehouseResult<()> {
        self.conn
            .execute(
                "INSERT INTO etl_run (run_id, source_path, started_at, final_stage, status)
                 VALUES (?1, ?2, ?3, ?4, 'running')",
                params![run_id, source_path, started_at, stage],
            )
            .store_context(format!("recording run {run_id}"))?;
        Ok(())
    }

    pub fn finish_run(
        &self,
        run_id: &str,
        finished_at: &str,
        stage: &str,
        status: &str,
        summary_json: Option<&str>,
        error: Option<&str>,
    ) -> WarehouseResult<()> {
        self.conn
            .execute(
                "UPDATE etl_run
                 SET finished_at = ?1, final_stage = ?2, status = ?3,
                     summary_json = ?4, error = ?5
                 WHERE run_id = ?6",
                params![finished_at, stage, status, summary_json, error, run_id],
            )
            .store_context(format!("closing run {run_id}"))?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> WarehouseResult<Option<RunRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, source_path, started_at, finished_at, final_stage,
                        status, summary_json, error
                 FROM etl_run WHERE run_id = ?1",
                params![run_id],
                |r| {
                    Ok(RunRow {
                        run_id: r.get(0)?,
                        source_path: r.get(1)?,
                        started_at: r.get(2)?,
                        finished_at: r.get(3)?,
                        final_stage: r.get(4)?,
                        status: r.get(5)?,
                        summary_json: r.get(6)?,
                        error: r.get(7)?,
                    })
                },
            )
            .optional()
            .store_context(format!("reading run {run_id}"))?;
        Ok(row)
    }
}
