use thiserror::Error;

use crate::pipeline::PipelineStage;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Schema creation failed: table '{table}' does not exist after DDL")]
    SchemaCreation { table: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Row count mismatch in '{table}': expected {expected}, got {actual}")]
    CountMismatch {
        table: String,
        expected: i64,
        actual: i64,
    },

    #[error("Referential integrity violated: {orphans} orphaned fact rows")]
    ReferentialIntegrity { orphans: i64 },

    #[error("{count} staging rows have no matching dimension key (first row ids: {sample:?})")]
    UnmatchedStagingRows { count: i64, sample: Vec<i64> },

    #[error("Invalid pipeline transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: PipelineStage,
        to: PipelineStage,
    },

    #[error("Store error while {context}: {source}")]
    Store {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Delimited file error: {0}")]
    Source(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WarehouseError {
    /// Expected, data-shaped failures the caller can fix by correcting the
    /// source file. Everything else is an operational fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WarehouseError::Validation(_)
                | WarehouseError::UnmatchedStagingRows { .. }
                | WarehouseError::ReferentialIntegrity { .. }
        )
    }
}

pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// Shape problems found in a source file before anything is written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Source has no header row")]
    EmptySource,

    #[error("Column mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    ColumnMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Invalid transaction types: {values:?}")]
    InvalidTypes { values: Vec<String> },

    #[error("Line {line}, column '{column}' (value '{value}'): expected {expected}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Cannot read source: {0}")]
    Unreadable(String),
}

/// Attach a description of the failing store operation to a rusqlite error.
pub trait StoreContext<T> {
    fn store_context(self, context: impl Into<String>) -> WarehouseResult<T>;
}

impl<T> StoreContext<T> for rusqlite::Result<T> {
    fn store_context(self, context: impl Into<String>) -> WarehouseResult<T> {
        self.map_err(|source| WarehouseError::Store {
            context: context.into(),
            source,
        })
    }
}
