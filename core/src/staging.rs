//! Staging load: a destructive, chunked reload of the raw source.
//!
//! Sequence: validate → count source rows → truncate → stream chunks into
//! one transaction → verify count → commit → audit.
//!
//! Staging ends either fully loaded or empty. Any failure after the
//! truncate rolls back every chunk. Assumes a single writer.

use crate::{
    error::{WarehouseError, WarehouseResult},
    integrity::{AuditReporter, LabelShare},
    source,
    store::{StagingBatch, Table, WarehouseStore},
    types::StagingRecord,
    validation::SchemaValidator,
};
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct StagingLoad {
    pub rows: i64,
    pub chunks: usize,
    pub rows_cleared: usize,
    pub type_distribution: Vec<LabelShare>,
    pub fraud_distribution: Vec<LabelShare>,
}

pub struct StagingLoader<'a> {
    store: &'a WarehouseStore,
    validator: SchemaValidator,
    delimiter: u8,
}

impl<'a> StagingLoader<'a> {
    pub fn new(store: &'a WarehouseStore, validator: SchemaValidator, delimiter: u8) -> Self {
        Self {
            store,
            validator,
            delimiter,
        }
    }

    pub fn load(&self, path: &Path, chunk_size: usize) -> WarehouseResult<StagingLoad> {
        self.validator.validate(path)?;

        let expected = source::count_data_rows(path)? as i64;
        log::info!("Loading staging table from {} ({expected} rows)...", path.display());

        let rows_cleared = self.store.truncate_staging()?;
        log::info!("Existing staging data cleared ({rows_cleared} rows)");

        let mut batch = self.store.begin_staging_load()?;
        let chunks = match self.stream_chunks(&mut batch, path, chunk_size.max(1)) {
            Ok(n) => n,
            Err(e) => {
                abandon(batch);
                return Err(e);
            }
        };

        let actual = batch.row_count()?;
        if actual != expected {
            log::error!("Expected {expected} staging rows, but got {actual}");
            abandon(batch);
            return Err(WarehouseError::CountMismatch {
                table: Table::Staging.name().to_string(),
                expected,
                actual,
            });
        }
        batch.commit()?;
        log::info!("Row count matches: {actual} rows in {chunks} chunks");

        let audit = AuditReporter::new(self.store).staging_distribution()?;
        Ok(StagingLoad {
            rows: actual,
            chunks,
            rows_cleared,
            type_distribution: audit.types,
            fraud_distribution: audit.fraud,
        })
    }

    /// Deserialize the source and flush every `chunk_size` records.
    /// At most one chunk is held in memory.
    fn stream_chunks(
        &self,
        batch: &mut StagingBatch<'_>,
        path: &Path,
        chunk_size: usize,
    ) -> WarehouseResult<usize> {
        let mut reader = source::open_reader(path, self.delimiter)?;
        let mut chunk: Vec<StagingRecord> = Vec::with_capacity(chunk_size);
        let mut chunks = 0;

        for record in reader.deserialize::<StagingRecord>() {
            chunk.push(record?);
            if chunk.len() == chunk_size {
                batch.insert_chunk(&chunk)?;
                chunk.clear();
                chunks += 1;
                log::debug!("chunk {chunks}: {} rows staged", batch.rows_written());
            }
        }
        if !chunk.is_empty() {
            batch.insert_chunk(&chunk)?;
            chunks += 1;
            log::debug!("chunk {chunks}: {} rows staged", batch.rows_written());
        }
        Ok(chunks)
    }
}

fn abandon(batch: StagingBatch<'_>) {
    if let Err(e) = batch.rollback() {
        log::error!("Staging rollback failed: {e}");
    }
}
