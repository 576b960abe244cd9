use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::Money;
use crate::errors::LedgerError;

/// how interest falls due on an interest-only loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestFrequency {
    Monthly,
    Yearly,
}

/// tag attached to every payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentNote {
    /// equated monthly installment on a bank loan
    Emi,
    /// interest-only servicing payment
    Interest,
    /// explicit principal reduction
    Principal,
    /// untagged legacy entry
    Unknown,
}

impl fmt::Display for PaymentNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentNote::Emi => write!(f, "EMI"),
            PaymentNote::Interest => write!(f, "INTEREST"),
            PaymentNote::Principal => write!(f, "PRINCIPAL"),
            PaymentNote::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// loan shape: fixed-EMI bank loan or interest-only borrowing
///
/// internally tagged so the stored JSON keeps the flat
/// `"loan_type": "BANK", "tenure": .., "emi": ..` layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "loan_type")]
pub enum LoanKind {
    #[serde(rename = "BANK")]
    Bank {
        #[serde(rename = "tenure")]
        tenure_months: u32,
        emi: Money,
    },
    #[serde(rename = "INTEREST_ONLY")]
    InterestOnly { interest_frequency: InterestFrequency },
}

impl LoanKind {
    /// check for the bank variant
    pub fn is_bank(&self) -> bool {
        matches!(self, LoanKind::Bank { .. })
    }
}

/// calendar month a payment is attributed to, `YYYY-MM`
///
/// stored internally as the first day of the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// month containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        // day 1 of an existing date's month always exists
        MonthKey(date.with_day(1).unwrap_or(date))
    }

    /// first calendar day of the month
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// check whether a date falls inside this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.0.year() && date.month() == self.0.month()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), self.0.month())
    }
}

impl FromStr for MonthKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let full = format!("{}-01", s);
        NaiveDate::parse_from_str(&full, "%Y-%m-%d")
            .map(MonthKey)
            .map_err(|_| LedgerError::InvalidMonthKey {
                value: s.to_string(),
            })
    }
}

/// inclusive month difference: Jan 2024 to Mar 2024 is 3 months
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32) + 1
}
