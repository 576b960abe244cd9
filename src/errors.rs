use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::MonthKey;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid loan terms: {message}")]
    InvalidLoanTerms { message: String },

    #[error("loan start date cannot be in the future: {start_date}")]
    StartDateInFuture { start_date: NaiveDate },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount { amount: Money },

    #[error("future payments are not allowed: {date}")]
    FutureDatedPayment { date: NaiveDate },

    #[error("EMI already paid for {month}")]
    DuplicateEmi { month: MonthKey },

    #[error("loan index out of range: {index} (have {len} loans)")]
    LoanIndexOutOfRange { index: usize, len: usize },

    #[error("invalid month key: {value}")]
    InvalidMonthKey { value: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// errors raised by the flat-file store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("finance file is corrupt (snapshot kept at {snapshot}): {source}")]
    Corrupt {
        snapshot: PathBuf,
        source: serde_json::Error,
    },

    #[error("could not encode finance document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("backup file not found: {path}")]
    BackupNotFound { path: PathBuf },
}
