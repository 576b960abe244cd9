use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::loan::Loan;
use crate::types::{InterestFrequency, LoanKind};

/// one month of the projected amortization plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// 1-based month index
    pub month: u32,
    pub opening_balance: Money,
    pub emi: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// theoretical month-by-month schedule for a bank loan
///
/// built fresh on every read from the loan's current balance and static
/// terms; never cached or persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmortizationSchedule {
    pub rows: Vec<ScheduleRow>,
    pub starting_balance: Money,
    /// balance left after the EMIs recorded so far
    pub remaining_balance: Money,
}

impl AmortizationSchedule {
    /// build the schedule for a bank loan; interest-only loans do not amortize
    pub fn for_loan(loan: &Loan) -> Option<Self> {
        match &loan.kind {
            LoanKind::Bank { tenure_months, emi } => Some(Self::build(
                loan.principal,
                loan.rate,
                *emi,
                *tenure_months,
                loan.emis_paid(),
            )),
            LoanKind::InterestOnly { .. } => None,
        }
    }

    /// build from raw terms
    pub fn build(principal: Money, rate: Rate, emi: Money, tenure_months: u32, emis_paid: usize) -> Self {
        let monthly_rate = rate.monthly();

        let mut rows = Vec::new();
        let mut balance = principal;

        for month in 1..=tenure_months {
            if balance <= Money::ZERO {
                break;
            }

            let opening = balance;
            let interest = opening * monthly_rate;
            let principal_component = (emi - interest).min(opening);
            let closing = opening - principal_component;

            rows.push(ScheduleRow {
                month,
                opening_balance: opening,
                emi,
                interest,
                principal: principal_component,
                closing_balance: closing,
            });

            balance = closing;
        }

        // zero payments and overflow both fall back to the starting balance
        let remaining_balance = if emis_paid > 0 && emis_paid <= rows.len() {
            rows[emis_paid - 1].closing_balance
        } else {
            principal
        };

        Self {
            rows,
            starting_balance: principal,
            remaining_balance,
        }
    }

    /// interest charged across the whole plan
    pub fn total_interest(&self) -> Money {
        self.rows
            .iter()
            .map(|r| r.interest)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// split of principal vs interest consumed by the EMIs paid so far
    pub fn paid_split(&self, emis_paid: usize) -> (Money, Money) {
        let upto = emis_paid.min(self.rows.len());
        let principal = self.rows[..upto]
            .iter()
            .map(|r| r.principal)
            .fold(Money::ZERO, |acc, x| acc + x);
        let interest = self.rows[..upto]
            .iter()
            .map(|r| r.interest)
            .fold(Money::ZERO, |acc, x| acc + x);
        (principal, interest)
    }
}

/// standard fixed-installment EMI: P * r * (1+r)^n / ((1+r)^n - 1)
pub fn calculate_emi(principal: Money, rate: Rate, tenure_months: u32) -> Money {
    if tenure_months == 0 {
        return principal;
    }

    let monthly_rate = rate.monthly();

    if monthly_rate.is_zero() {
        // straight line, avoids division by zero
        return principal / Decimal::from(tenure_months);
    }

    let mut compound = Decimal::ONE;
    let base = Decimal::ONE + monthly_rate;
    for _ in 0..tenure_months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * monthly_rate * compound;
    let denominator = compound - Decimal::ONE;

    Money::from_decimal(numerator / denominator)
}

/// periodic interest due on an interest-only loan
pub fn calculate_interest_only(principal: Money, rate: Rate, frequency: InterestFrequency) -> Money {
    let yearly = principal * rate.as_decimal();
    match frequency {
        InterestFrequency::Yearly => yearly,
        InterestFrequency::Monthly => yearly / Decimal::from(12),
    }
}
