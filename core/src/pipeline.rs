//! The pipeline: drives one warehouse load from raw file to verified star.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Schema      ensure star schema + staging table
//!   2. Staging     validate, truncate, chunked load, count check
//!   3. Dimensions  dim_time, then dim_account
//!   4. Facts       join staging against every dimension
//!   5. Verify      orphan check, fraud distribution
//!
//! RULES:
//!   - Stages advance one at a time through PipelineStage.
//!   - The first error aborts the run. Completed stages stay in place.
//!   - No retries here. Retry policy belongs to whoever runs the pipeline.
//!   - One pipeline per warehouse at a time. Nothing here locks.

use crate::{
    config::WarehouseConfig,
    dimension::{DimensionLoad, DimensionPopulator},
    error::{WarehouseError, WarehouseResult},
    fact::{FactLoad, FactOptions, FactPopulator},
    integrity::{AuditReporter, IntegrityReport, IntegrityVerifier, LabelShare},
    schema::SchemaManager,
    staging::{StagingLoad, StagingLoader},
    store::WarehouseStore,
    types::RunId,
    validation::SchemaValidator,
};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    SchemaPending,
    SchemaReady,
    StagingLoading,
    StagingLoaded,
    DimensionsPopulating,
    DimensionsReady,
    FactsPopulating,
    FactsReady,
    Verified,
}

impl PipelineStage {
    /// The only stage reachable from this one.
    pub fn next(self) -> Option<PipelineStage> {
        use PipelineStage::*;
        match self {
            SchemaPending => Some(SchemaReady),
            SchemaReady => Some(StagingLoading),
            StagingLoading => Some(StagingLoaded),
            StagingLoaded => Some(DimensionsPopulating),
            DimensionsPopulating => Some(DimensionsReady),
            DimensionsReady => Some(FactsPopulating),
            FactsPopulating => Some(FactsReady),
            FactsReady => Some(Verified),
            Verified => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::SchemaPending => "schema_pending",
            PipelineStage::SchemaReady => "schema_ready",
            PipelineStage::StagingLoading => "staging_loading",
            PipelineStage::StagingLoaded => "staging_loaded",
            PipelineStage::DimensionsPopulating => "dimensions_populating",
            PipelineStage::DimensionsReady => "dimensions_ready",
            PipelineStage::FactsPopulating => "facts_populating",
            PipelineStage::FactsReady => "facts_ready",
            PipelineStage::Verified => "verified",
        }
    }
}

/// Everything a successful run produced. Stored as JSON in the run ledger.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub source: String,
    pub staging: StagingLoad,
    pub time: DimensionLoad,
    pub accounts: DimensionLoad,
    pub facts: FactLoad,
    pub integrity: IntegrityReport,
    pub fraud_distribution: Vec<LabelShare>,
}

pub struct Pipeline<'a> {
    run_id: RunId,
    store: &'a WarehouseStore,
    config: WarehouseConfig,
    stage: PipelineStage,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a WarehouseStore, config: WarehouseConfig) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            store,
            config,
            stage: PipelineStage::SchemaPending,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Execute every stage against `source` and record the outcome in the
    /// run ledger. A pipeline runs once.
    pub fn run(mut self, source: &Path) -> WarehouseResult<RunSummary> {
        SchemaManager::new(self.store).ensure_run_ledger()?;
        let started_at = chrono::Utc::now().to_rfc3339();
        self.store.insert_run(
            &self.run_id,
            &source.display().to_string(),
            &started_at,
            self.stage.as_str(),
        )?;
        log::info!("run {}: loading {}", self.run_id, source.display());

        let result = self.execute(source);
        let finished_at = chrono::Utc::now().to_rfc3339();
        let (result, recorded) = match result {
            Ok(summary) => match serde_json::to_string(&summary) {
                Ok(json) => {
                    log::info!("run {}: verified", self.run_id);
                    let recorded = self.store.finish_run(
                        &self.run_id,
                        &finished_at,
                        self.stage.as_str(),
                        "succeeded",
                        Some(json.as_str()),
                        None,
                    );
                    (Ok(summary), recorded)
                }
                Err(e) => {
                    let e = WarehouseError::from(e);
                    let recorded = self.record_failure(&finished_at, &e);
                    (Err(e), recorded)
                }
            },
            Err(e) => {
                let recorded = self.record_failure(&finished_at, &e);
                (Err(e), recorded)
            }
        };
        // The stage error matters more than a ledger write failure.
        if let Err(e) = recorded {
            log::error!("run {}: could not update run ledger: {e}", self.run_id);
            if result.is_ok() {
                return Err(e);
            }
        }
        result
    }

    fn record_failure(&self, finished_at: &str, error: &WarehouseError) -> WarehouseResult<()> {
        log::error!(
            "run {}: failed at {}: {error}",
            self.run_id,
            self.stage.as_str()
        );
        self.store.finish_run(
            &self.run_id,
            finished_at,
            self.stage.as_str(),
            "failed",
            None,
            Some(&error.to_string()),
        )
    }

    fn execute(&mut self, source: &Path) -> WarehouseResult<RunSummary> {
        // 1. Schema
        let schema = SchemaManager::new(self.store);
        schema.ensure_star_schema()?;
        schema.ensure_staging_table()?;
        self.advance(PipelineStage::SchemaReady)?;

        // 2. Staging
        self.advance(PipelineStage::StagingLoading)?;
        let validator = SchemaValidator::new(
            self.config.ingestion.validation_sample_rows,
            self.config.delimiter(),
        );
        let staging = StagingLoader::new(self.store, validator, self.config.delimiter())
            .load(source, self.config.ingestion.chunk_size)?;
        self.advance(PipelineStage::StagingLoaded)?;

        // 3. Dimensions
        self.advance(PipelineStage::DimensionsPopulating)?;
        let dims = DimensionPopulator::new(self.store);
        let time = dims.populate_time()?;
        let accounts = dims.populate_accounts()?;
        self.advance(PipelineStage::DimensionsReady)?;

        // 4. Facts
        self.advance(PipelineStage::FactsPopulating)?;
        let options = FactOptions {
            fail_on_unmatched: self.config.integrity.fail_on_unmatched,
            max_reported_unmatched: self.config.integrity.max_reported_unmatched,
        };
        let facts = FactPopulator::new(self.store, options).populate_facts()?;
        self.advance(PipelineStage::FactsReady)?;

        // 5. Verify
        let integrity =
            IntegrityVerifier::new(self.store, self.config.integrity.fail_on_orphans)
                .verify_referential_integrity()?;
        let fraud_distribution = AuditReporter::new(self.store).report_fraud_distribution()?;
        self.advance(PipelineStage::Verified)?;

        Ok(RunSummary {
            run_id: self.run_id.clone(),
            source: source.display().to_string(),
            staging,
            time,
            accounts,
            facts,
            integrity,
            fraud_distribution,
        })
    }

    fn advance(&mut self, to: PipelineStage) -> WarehouseResult<()> {
        if self.stage.next() != Some(to) {
            return Err(WarehouseError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        log::debug!("run {}: {} -> {}", self.run_id, self.stage.as_str(), to.as_str());
        self.stage = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_form_a_single_chain() {
        let mut stage = PipelineStage::SchemaPending;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen.len(), 9);
        assert_eq!(stage, PipelineStage::Verified);
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let store = WarehouseStore::in_memory().unwrap();
        let mut pipeline = Pipeline::new(&store, WarehouseConfig::default_test());
        let err = pipeline
            .advance(PipelineStage::StagingLoading)
            .unwrap_err();
        assert!(matches!(
            err,
            WarehouseError::InvalidTransition {
                from: PipelineStage::SchemaPending,
                to: PipelineStage::StagingLoading,
            }
        ));
        assert_eq!(pipeline.stage(), PipelineStage::SchemaPending);
    }

    #[test]
    fn summary_encoding_failure_closes_the_run_as_failed() {
        let store = WarehouseStore::in_memory().unwrap();
        SchemaManager::new(&store).ensure_run_ledger().unwrap();
        let pipeline = Pipeline::new(&store, WarehouseConfig::default_test());
        store
            .insert_run(pipeline.run_id(), "raw.csv", "2024-01-01T00:00:00Z", "verified")
            .unwrap();

        let encode_err = serde_json::from_str::<i64>("not json").unwrap_err();
        pipeline
            .record_failure("2024-01-01T00:00:01Z", &WarehouseError::from(encode_err))
            .unwrap();

        let run = store.get_run(pipeline.run_id()).unwrap().unwrap();
        assert_eq!(run.status, "failed");
        assert!(run.summary_json.is_none());
        assert!(run.error.unwrap().starts_with("Serialization error"));
    }
}
