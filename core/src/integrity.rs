//! Post-load verification and audit reporting.

use crate::{
    error::{WarehouseError, WarehouseResult},
    store::{LabelCount, WarehouseStore},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelShare {
    pub label: String,
    pub count: i64,
    pub percent: f64,
}

impl LabelShare {
    fn from_counts(counts: Vec<LabelCount>) -> Vec<LabelShare> {
        let total: i64 = counts.iter().map(|c| c.count).sum();
        counts
            .into_iter()
            .map(|c| LabelShare {
                percent: if total > 0 {
                    c.count as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
                label: c.label,
                count: c.count,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagingAudit {
    pub types: Vec<LabelShare>,
    pub fraud: Vec<LabelShare>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub orphans: i64,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphans == 0
    }
}

pub struct IntegrityVerifier<'a> {
    store: &'a WarehouseStore,
    fail_on_orphans: bool,
}

impl<'a> IntegrityVerifier<'a> {
    pub fn new(store: &'a WarehouseStore, fail_on_orphans: bool) -> Self {
        Self {
            store,
            fail_on_orphans,
        }
    }

    /// Count fact rows whose foreign keys do not all resolve.
    /// A nonzero count is a warning unless `fail_on_orphans` is set.
    pub fn verify_referential_integrity(&self) -> WarehouseResult<IntegrityReport> {
        log::info!("Verifying referential integrity...");
        let orphans = self.store.orphaned_fact_count()?;
        if orphans == 0 {
            log::info!("No orphaned records found");
            return Ok(IntegrityReport { orphans });
        }
        if self.fail_on_orphans {
            log::error!("Found {orphans} orphaned fact rows");
            return Err(WarehouseError::ReferentialIntegrity { orphans });
        }
        log::warn!("Found {orphans} orphaned fact rows");
        Ok(IntegrityReport { orphans })
    }
}

pub struct AuditReporter<'a> {
    store: &'a WarehouseStore,
}

impl<'a> AuditReporter<'a> {
    pub fn new(store: &'a WarehouseStore) -> Self {
        Self { store }
    }

    /// Fraudulent vs. non-fraudulent fact rows. Observational only.
    pub fn report_fraud_distribution(&self) -> WarehouseResult<Vec<LabelShare>> {
        let shares = LabelShare::from_counts(self.store.fact_fraud_distribution()?);
        log::info!("Fact fraud distribution:");
        log_shares(&shares);
        Ok(shares)
    }

    /// Type and fraud-label distribution of the staging table.
    pub fn staging_distribution(&self) -> WarehouseResult<StagingAudit> {
        let fraud = LabelShare::from_counts(self.store.staging_fraud_distribution()?);
        log::info!("Staging fraud distribution:");
        log_shares(&fraud);

        let types = LabelShare::from_counts(self.store.staging_type_distribution()?);
        log::info!("Staging transaction type distribution:");
        log_shares(&types);

        Ok(StagingAudit { types, fraud })
    }
}

fn log_shares(shares: &[LabelShare]) {
    for s in shares {
        log::info!("  {}: {} rows ({:.2}%)", s.label, s.count, s.percent);
    }
}
