//! Fail-fast shape check of a raw source before anything is written.
//!
//! Checks, in order, over the first `sample_rows` data rows:
//!   1. the header holds exactly the expected column set
//!   2. every `type` value is one of the five known labels
//!   3. typed columns parse on every sampled row
//!
//! The first failing check is returned. Nothing touches the store.

use crate::{
    error::ValidationError,
    source,
    types::{TransactionType, EXPECTED_COLUMNS},
};
use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Step,
    Money,
    Flag,
    AccountId,
}

impl ColumnKind {
    fn expected(&self) -> &'static str {
        match self {
            ColumnKind::Step => "a non-negative integer",
            ColumnKind::Money => "a finite number",
            ColumnKind::Flag => "0 or 1",
            ColumnKind::AccountId => "a non-empty account id",
        }
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            ColumnKind::Step => value.parse::<i64>().is_ok_and(|v| v >= 0),
            ColumnKind::Money => value.parse::<f64>().is_ok_and(f64::is_finite),
            ColumnKind::Flag => matches!(value.parse::<i64>(), Ok(0 | 1)),
            ColumnKind::AccountId => !value.is_empty(),
        }
    }
}

const TYPED_COLUMNS: [(&str, ColumnKind); 10] = [
    ("step", ColumnKind::Step),
    ("amount", ColumnKind::Money),
    ("nameOrig", ColumnKind::AccountId),
    ("oldbalanceOrg", ColumnKind::Money),
    ("newbalanceOrig", ColumnKind::Money),
    ("nameDest", ColumnKind::AccountId),
    ("oldbalanceDest", ColumnKind::Money),
    ("newbalanceDest", ColumnKind::Money),
    ("isFraud", ColumnKind::Flag),
    ("isFlaggedFraud", ColumnKind::Flag),
];

/// What a passing validation looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub columns: Vec<String>,
    pub rows_sampled: usize,
}

pub struct SchemaValidator {
    sample_rows: usize,
    delimiter: u8,
}

impl SchemaValidator {
    pub fn new(sample_rows: usize, delimiter: u8) -> Self {
        Self {
            sample_rows,
            delimiter,
        }
    }

    pub fn validate(&self, path: &Path) -> Result<ValidationReport, ValidationError> {
        log::info!("Validating schema for {}...", path.display());
        let result = self.check(path);
        match &result {
            Ok(report) => log::info!(
                "Schema validation successful ({} rows sampled)",
                report.rows_sampled
            ),
            Err(e) => log::error!("Schema validation failed for {}: {e}", path.display()),
        }
        result
    }

    fn check(&self, path: &Path) -> Result<ValidationReport, ValidationError> {
        let mut reader = source::open_reader(path, self.delimiter)
            .map_err(|e| ValidationError::Unreadable(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| ValidationError::Unreadable(e.to_string()))?
            .clone();
        let columns: Vec<String> = headers.iter().map(str::to_string).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(ValidationError::EmptySource);
        }
        check_columns(&columns)?;

        let index: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut sample = Vec::with_capacity(self.sample_rows.min(4096));
        for record in reader.records().take(self.sample_rows) {
            sample.push(record.map_err(|e| ValidationError::Unreadable(e.to_string()))?);
        }

        let type_idx = index["type"];
        let invalid_types: BTreeSet<String> = sample
            .iter()
            .filter_map(|r| r.get(type_idx))
            .filter(|v| v.parse::<TransactionType>().is_err())
            .map(str::to_string)
            .collect();
        if !invalid_types.is_empty() {
            return Err(ValidationError::InvalidTypes {
                values: invalid_types.into_iter().collect(),
            });
        }

        for (n, record) in sample.iter().enumerate() {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(n as u64 + 2);
            for (column, kind) in TYPED_COLUMNS {
                let value = record.get(index[column]).unwrap_or("");
                if !kind.accepts(value) {
                    return Err(ValidationError::InvalidValue {
                        line,
                        column: column.to_string(),
                        value: value.to_string(),
                        expected: kind.expected(),
                    });
                }
            }
        }

        Ok(ValidationReport {
            columns,
            rows_sampled: sample.len(),
        })
    }
}

/// Exact set match. A repeated header counts as unexpected.
fn check_columns(columns: &[String]) -> Result<(), ValidationError> {
    let expected: BTreeSet<&str> = EXPECTED_COLUMNS.iter().copied().collect();
    let mut seen = BTreeSet::new();
    let mut unexpected = BTreeSet::new();
    for c in columns {
        if !expected.contains(c.as_str()) || !seen.insert(c.as_str()) {
            unexpected.insert(c.clone());
        }
    }
    let missing: Vec<String> = expected
        .difference(&seen)
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }
    Err(ValidationError::ColumnMismatch {
        missing,
        unexpected: unexpected.into_iter().collect(),
    })
}
