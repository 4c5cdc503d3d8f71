//! Shared primitive types used across the entire pipeline.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One simulation step in the source data. One step = one hour.
pub type Step = i64;

/// A store-generated identifier for a dimension or fact row.
pub type SurrogateKey = i64;

/// The canonical pipeline run identifier.
pub type RunId = String;

/// Source column names, in the order the raw file lays them out.
pub const EXPECTED_COLUMNS: [&str; 11] = [
    "step",
    "type",
    "amount",
    "nameOrig",
    "oldbalanceOrg",
    "newbalanceOrig",
    "nameDest",
    "oldbalanceDest",
    "newbalanceDest",
    "isFraud",
    "isFlaggedFraud",
];

pub const HOURS_PER_DAY: Step = 24;

/// Hour of day for a step.
pub fn hour_of(step: Step) -> Step {
    step % HOURS_PER_DAY
}

/// Day index for a step.
pub fn day_of(step: Step) -> Step {
    step / HOURS_PER_DAY
}

/// The fixed set of transaction type labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    CashIn,
    CashOut,
    Debit,
    Payment,
    Transfer,
}

impl TransactionType {
    pub const ALL: [TransactionType; 5] = [
        TransactionType::CashIn,
        TransactionType::CashOut,
        TransactionType::Debit,
        TransactionType::Payment,
        TransactionType::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CashIn => "CASH_IN",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Debit => "DEBIT",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown transaction type '{s}'"))
    }
}

/// Account category, encoded by the first character of the account id
/// (`C1231006815` is a customer, `M1979787155` a merchant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Customer,
    Merchant,
    Other(char),
}

impl AccountType {
    pub fn from_account_id(account_id: &str) -> Option<Self> {
        account_id.chars().next().map(Self::from_code)
    }

    pub fn from_code(code: char) -> Self {
        match code {
            'C' => AccountType::Customer,
            'M' => AccountType::Merchant,
            other => AccountType::Other(other),
        }
    }

    pub fn code(&self) -> char {
        match self {
            AccountType::Customer => 'C',
            AccountType::Merchant => 'M',
            AccountType::Other(c) => *c,
        }
    }
}

/// One raw source row, as it lands in staging.
/// `txn_type` stays a plain string: staging holds unvalidated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRecord {
    pub step: Step,
    #[serde(rename = "type")]
    pub txn_type: String,
    pub amount: f64,
    #[serde(rename = "nameOrig")]
    pub name_orig: String,
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_orig: f64,
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_orig: f64,
    #[serde(rename = "nameDest")]
    pub name_dest: String,
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_dest: f64,
    #[serde(rename = "newbalanceDest")]
    pub new_balance_dest: f64,
    #[serde(rename = "isFraud")]
    pub is_fraud: i64,
    #[serde(rename = "isFlaggedFraud")]
    pub is_flagged_fraud: i64,
}
