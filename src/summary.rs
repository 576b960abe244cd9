use chrono::Datelike;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::decimal::Money;
use crate::ledger::LoanLedger;
use crate::types::LoanKind;

/// three-level read on the monthly EMI burden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressStatus {
    /// no burden, or EMIs are a small share of outstanding debt
    Safe,
    /// EMIs are heavy relative to outstanding debt
    Tight,
    /// at least one bank loan is behind its monthly cadence
    Critical,
}

impl fmt::Display for StressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressStatus::Safe => write!(f, "SAFE"),
            StressStatus::Tight => write!(f, "TIGHT"),
            StressStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// aggregate view across the whole ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub status: StressStatus,
    pub total_emi: Money,
    pub total_outstanding: Money,
    pub overdue: bool,
}

/// EMIs below this share of outstanding debt read as safe
const SAFE_EMI_SHARE: Decimal = dec!(0.02);

/// summarize the ledger's burden as of today
pub fn summarize(ledger: &LoanLedger, time: &SafeTimeProvider) -> FinanceSummary {
    let today = time.now().date_naive();

    let total_emi = ledger
        .loans
        .iter()
        .filter_map(|l| match &l.kind {
            LoanKind::Bank { emi, .. } => Some(*emi),
            LoanKind::InterestOnly { .. } => None,
        })
        .fold(Money::ZERO, |acc, x| acc + x);

    let total_outstanding = ledger
        .loans
        .iter()
        .map(|l| l.principal)
        .fold(Money::ZERO, |acc, x| acc + x);

    let overdue = ledger
        .loans
        .iter()
        .filter(|l| l.kind.is_bank())
        .any(|l| l.emis_overdue(today) > 0);

    let status = if overdue {
        StressStatus::Critical
    } else if total_emi.is_zero() || total_emi < total_outstanding * SAFE_EMI_SHARE {
        StressStatus::Safe
    } else {
        StressStatus::Tight
    };

    FinanceSummary {
        status,
        total_emi,
        total_outstanding,
        overdue,
    }
}

/// where payments went over a year or a single month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingInsights {
    pub total_paid: Money,
    /// estimated interest share, at each loan's current balance
    pub interest_paid: Money,
    pub principal_paid: Money,
    /// loan receiving the most payments in the window
    pub top_drain: Option<String>,
}

/// aggregate payments for a year, optionally narrowed to one month
pub fn spending_insights(ledger: &LoanLedger, year: i32, month: Option<u32>) -> SpendingInsights {
    let mut total_paid = Money::ZERO;
    let mut interest_paid = Money::ZERO;
    let mut principal_paid = Money::ZERO;
    let mut by_loan: BTreeMap<&str, Money> = BTreeMap::new();

    for loan in &ledger.loans {
        let monthly_rate = loan.rate.monthly();

        for payment in &loan.payments {
            if payment.date.year() != year {
                continue;
            }
            if let Some(m) = month {
                if payment.date.month() != m {
                    continue;
                }
            }

            total_paid += payment.amount;

            let interest = loan.principal * monthly_rate;
            interest_paid += interest;
            principal_paid += (payment.amount - interest).max(Money::ZERO);

            *by_loan.entry(loan.name.as_str()).or_insert(Money::ZERO) += payment.amount;
        }
    }

    let top_drain = by_loan
        .iter()
        .max_by(|a, b| a.1.cmp(b.1))
        .map(|(name, _)| name.to_string());

    SpendingInsights {
        total_paid,
        interest_paid,
        principal_paid,
        top_drain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::{InterestFrequency, PaymentNote};
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use pretty_assertions::assert_eq;

    fn clock(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_ledger_is_safe() {
        let time = clock(2024, 6, 15);
        let summary = summarize(&LoanLedger::new(), &time);
        assert_eq!(summary.status, StressStatus::Safe);
        assert!(!summary.overdue);
        assert_eq!(summary.total_emi, Money::ZERO);
    }

    #[test]
    fn test_overdue_bank_loan_is_critical() {
        let time = clock(2024, 6, 15);
        let mut ledger = LoanLedger::new();
        ledger
            .add_loan(
                "Home Loan",
                Money::from_major(100_000),
                Rate::from_percentage(12),
                date(2024, 1, 1),
                LoanKind::Bank {
                    tenure_months: 12,
                    emi: Money::from_major(8_885),
                },
                &time,
            )
            .unwrap();

        // six months elapsed, nothing paid
        let summary = summarize(&ledger, &time);
        assert_eq!(summary.status, StressStatus::Critical);
        assert!(summary.overdue);
    }

    #[test]
    fn test_interest_only_loans_carry_no_emi_burden() {
        let time = clock(2024, 6, 15);
        let mut ledger = LoanLedger::new();
        ledger
            .add_loan(
                "Family Loan",
                Money::from_major(100_000),
                Rate::from_percentage(12),
                date(2024, 1, 1),
                LoanKind::InterestOnly {
                    interest_frequency: InterestFrequency::Monthly,
                },
                &time,
            )
            .unwrap();

        let summary = summarize(&ledger, &time);
        assert_eq!(summary.total_emi, Money::ZERO);
        assert_eq!(summary.status, StressStatus::Safe);
    }

    #[test]
    fn test_spending_insights_filters_by_window() {
        let time = clock(2024, 6, 15);
        let mut ledger = LoanLedger::new();
        ledger
            .add_loan(
                "Home Loan",
                Money::from_major(100_000),
                Rate::from_percentage(12),
                date(2024, 1, 1),
                LoanKind::Bank {
                    tenure_months: 12,
                    emi: Money::from_major(8_885),
                },
                &time,
            )
            .unwrap();
        for month in ["2024-02", "2024-03"] {
            ledger
                .record_payment(
                    0,
                    Money::from_major(8_885),
                    PaymentNote::Emi,
                    Some(month.parse().unwrap()),
                    &time,
                )
                .unwrap();
        }

        let year = spending_insights(&ledger, 2024, None);
        assert_eq!(year.total_paid, Money::from_major(17_770));
        assert_eq!(year.top_drain.as_deref(), Some("Home Loan"));

        let feb = spending_insights(&ledger, 2024, Some(2));
        assert_eq!(feb.total_paid, Money::from_major(8_885));

        let other_year = spending_insights(&ledger, 2023, None);
        assert_eq!(other_year.total_paid, Money::ZERO);
        assert!(other_year.top_drain.is_none());
    }
}
