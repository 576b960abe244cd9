use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::{months_between, LoanKind, PaymentNote};

/// a recorded payment event, immutable once written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// conventionally the first day of the month the payment targets
    pub date: NaiveDate,
    pub amount: Money,
    pub note: PaymentNote,
}

/// one borrowing instrument and its payment history
///
/// `taken_amount` is the immutable original principal. the stored `principal`
/// is a cache of [`Loan::replayed_principal`] and is refreshed after every
/// mutation; the payment list is the single source of truth for the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub name: String,
    pub principal: Money,
    pub taken_amount: Money,
    pub rate: Rate,
    pub start_date: NaiveDate,
    #[serde(flatten)]
    pub kind: LoanKind,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Loan {
    /// create a new loan with validated terms
    pub fn new(
        name: impl Into<String>,
        principal: Money,
        rate: Rate,
        start_date: NaiveDate,
        kind: LoanKind,
        today: NaiveDate,
    ) -> Result<Self> {
        if start_date > today {
            return Err(LedgerError::StartDateInFuture { start_date });
        }
        if !principal.is_positive() {
            return Err(LedgerError::InvalidLoanTerms {
                message: format!("principal must be positive, got {}", principal),
            });
        }
        if rate.is_negative() {
            return Err(LedgerError::InvalidLoanTerms {
                message: format!("interest rate cannot be negative, got {}", rate),
            });
        }
        if let LoanKind::Bank { tenure_months, emi } = &kind {
            if *tenure_months < 1 {
                return Err(LedgerError::InvalidLoanTerms {
                    message: "bank loan tenure must be at least 1 month".to_string(),
                });
            }
            if !emi.is_positive() {
                return Err(LedgerError::InvalidLoanTerms {
                    message: format!("bank loan EMI must be positive, got {}", emi),
                });
            }
        }

        Ok(Self {
            name: name.into(),
            principal,
            taken_amount: principal,
            rate,
            start_date,
            kind,
            payments: Vec::new(),
        })
    }

    /// number of EMI payments recorded so far
    pub fn emis_paid(&self) -> usize {
        self.payments
            .iter()
            .filter(|p| p.note == PaymentNote::Emi)
            .count()
    }

    /// months elapsed since the loan started, inclusive of the start month
    pub fn emis_elapsed(&self, today: NaiveDate) -> u32 {
        months_between(self.start_date, today).max(0) as u32
    }

    /// installments behind the monthly cadence
    pub fn emis_overdue(&self, today: NaiveDate) -> u32 {
        self.emis_elapsed(today)
            .saturating_sub(self.emis_paid() as u32)
    }

    /// interest due per period on an interest-only loan
    pub fn interest_only_due(&self) -> Option<Money> {
        match &self.kind {
            LoanKind::InterestOnly { interest_frequency } => Some(
                crate::schedule::calculate_interest_only(self.principal, self.rate, *interest_frequency),
            ),
            LoanKind::Bank { .. } => None,
        }
    }

    /// outstanding balance derived by replaying the payment history
    /// against the original principal
    pub fn replayed_principal(&self) -> Money {
        let mut balance = self.taken_amount;
        for payment in &self.payments {
            match (&self.kind, payment.note) {
                (LoanKind::InterestOnly { .. }, PaymentNote::Principal) => {
                    balance = (balance - payment.amount).max(Money::ZERO);
                }
                (LoanKind::Bank { .. }, PaymentNote::Emi) => {
                    let interest = balance * self.rate.monthly();
                    let principal_component = (payment.amount - interest).max(Money::ZERO);
                    balance = (balance - principal_component).max(Money::ZERO);
                }
                // INTEREST and UNKNOWN never touch the balance
                _ => {}
            }
        }
        balance
    }

    /// refresh the cached balance from the payment history
    pub fn recompute_principal(&mut self) {
        self.principal = self.replayed_principal();
    }

    pub fn last_payment(&self) -> Option<&Payment> {
        self.payments.last()
    }
}
