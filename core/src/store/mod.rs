//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Pipeline components call store methods. They never execute SQL directly.

mod audit;
mod dimension;
mod fact;
mod run;
mod staging;

pub use fact::FactRebuild;
pub use staging::StagingBatch;

use crate::{
    error::{StoreContext, WarehouseResult},
    types::{Step, SurrogateKey},
};
use rusqlite::{params, Connection};
use serde::Serialize;

pub struct WarehouseStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

/// Every table the pipeline owns. Table names never come from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Staging,
    DimTransactionType,
    DimTime,
    DimAccount,
    Fact,
    EtlRun,
}

impl Table {
    pub const STAR_SCHEMA: [Table; 4] = [
        Table::DimTransactionType,
        Table::DimTime,
        Table::DimAccount,
        Table::Fact,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Staging => "staging_transactions",
            Table::DimTransactionType => "dim_transaction_type",
            Table::DimTime => "dim_time",
            Table::DimAccount => "dim_account",
            Table::Fact => "fact_transactions",
            Table::EtlRun => "etl_run",
        }
    }
}

impl WarehouseStore {
    pub fn open(path: &str) -> WarehouseResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )
        .store_context(format!("opening {path}"))?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> WarehouseResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// The file backing this store, or None for an in-memory database.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Round-trip a trivial statement and return the SQLite version.
    pub fn verify_connection(&self) -> WarehouseResult<String> {
        self.conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .store_context("checking connection")
    }

    // ── DDL ────────────────────────────────────────────────────

    pub fn apply_staging_schema(&self) -> WarehouseResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_staging.sql"))
            .store_context("creating staging table")
    }

    pub fn apply_star_schema(&self) -> WarehouseResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/002_star_schema.sql"))
            .store_context("creating star schema")
    }

    pub fn apply_run_ledger_schema(&self) -> WarehouseResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/003_etl_run.sql"))
            .store_context("creating run ledger")
    }

    pub fn table_exists(&self, table: Table) -> WarehouseResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table.name()],
                |row| row.get(0),
            )
            .store_context(format!("looking up table {}", table.name()))?;
        Ok(count > 0)
    }

    pub fn row_count(&self, table: Table) -> WarehouseResult<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |row| {
                row.get(0)
            })
            .store_context(format!("counting {}", table.name()))
    }
}

// ── Row types ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRow {
    pub id: SurrogateKey,
    pub step: Step,
    pub hour: i64,
    pub day: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRow {
    pub id: SurrogateKey,
    pub account_id: String,
    pub account_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionTypeRow {
    pub id: SurrogateKey,
    pub type_name: String,
}

/// A grouped count from a GROUP BY over a label column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// The dimension a staging row failed to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Time,
    TransactionType,
    OriginAccount,
    DestinationAccount,
}

/// A staging row the fact join would drop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedRow {
    pub row_id: i64,
    pub step: Step,
    pub txn_type: String,
    pub name_orig: String,
    pub name_dest: String,
    pub missing: Vec<Dimension>,
}

/// One row of the fully joined warehouse, as downstream consumers read it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseRow {
    pub step: Step,
    pub hour: i64,
    pub day: i64,
    pub type_name: String,
    pub origin_account: String,
    pub origin_type: String,
    pub destination_account: String,
    pub destination_type: String,
    pub amount: f64,
    pub old_balance_orig: f64,
    pub new_balance_orig: f64,
    pub old_balance_dest: f64,
    pub new_balance_dest: f64,
    pub is_fraud: i64,
    pub is_flagged_fraud: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunRow {
    pub run_id: String,
    pub source_path: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub final_stage: String,
    pub status: String,
    pub summary_json: Option<String>,
    pub error: Option<String>,
}
