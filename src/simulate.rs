use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::ledger::LoanLedger;
use crate::loan::Loan;
use crate::schedule::AmortizationSchedule;
use crate::summary::{summarize, StressStatus};
use crate::types::LoanKind;

/// projected payoff horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectedTerm {
    Months(u32),
    /// the EMI never covers the interest, so the balance never shrinks
    NonAmortizing,
}

impl ProjectedTerm {
    pub fn months(&self) -> Option<u32> {
        match self {
            ProjectedTerm::Months(m) => Some(*m),
            ProjectedTerm::NonAmortizing => None,
        }
    }
}

/// outcome of simulating an extra lump-sum payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaymentForecast {
    pub new_remaining_term: ProjectedTerm,
    /// undefined when the projection cannot amortize
    pub interest_saved: Option<Money>,
}

/// project the effect of prepaying `amount` against a bank loan
///
/// a pure projection, never touching stored state. returns `None` for
/// interest-only loans, non-positive amounts, and full payoffs (out of
/// simulation scope)
pub fn forecast_prepayment(loan: &Loan, amount: Money) -> Option<PrepaymentForecast> {
    let emi = match &loan.kind {
        LoanKind::Bank { emi, .. } => *emi,
        LoanKind::InterestOnly { .. } => return None,
    };

    let schedule = AmortizationSchedule::for_loan(loan)?;
    let remaining = schedule.remaining_balance;

    if !amount.is_positive() || amount >= remaining {
        return None;
    }

    let monthly_rate = loan.rate.monthly();
    let mut balance = remaining - amount;
    let mut months = 0u32;
    let mut projected_interest = Money::ZERO;

    while balance > Money::ZERO {
        let interest = balance * monthly_rate;
        let principal_component = (emi - interest).min(balance);
        if principal_component <= Money::ZERO {
            return Some(PrepaymentForecast {
                new_remaining_term: ProjectedTerm::NonAmortizing,
                interest_saved: None,
            });
        }
        balance -= principal_component;
        projected_interest += interest;
        months += 1;
    }

    Some(PrepaymentForecast {
        new_remaining_term: ProjectedTerm::Months(months),
        interest_saved: Some(schedule.total_interest() - projected_interest),
    })
}

/// stress status before and after a hypothetical lump-sum payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressReport {
    pub before: StressStatus,
    pub after: StressStatus,
    pub new_remaining_term: ProjectedTerm,
    /// interest still to be paid in the projected plan
    pub future_interest: Money,
}

/// simulate how a lump-sum payment changes the dashboard stress status
///
/// `Ok(None)` for interest-only loans; the ledger is never mutated
pub fn stress_simulation(
    ledger: &LoanLedger,
    index: usize,
    amount: Money,
    time: &SafeTimeProvider,
) -> Result<Option<StressReport>> {
    let loan = ledger.loan(index)?;

    let (emi, tenure_months) = match &loan.kind {
        LoanKind::Bank { emi, tenure_months } => (*emi, *tenure_months),
        LoanKind::InterestOnly { .. } => return Ok(None),
    };

    let before = summarize(ledger, time).status;

    let monthly_rate = loan.rate.monthly();
    let mut balance = (loan.principal - amount).max(Money::ZERO);
    let mut months = 0u32;
    let mut future_interest = Money::ZERO;
    let mut term = ProjectedTerm::Months(0);

    while balance > Money::ZERO {
        let interest = balance * monthly_rate;
        let principal_component = (emi - interest).min(balance);
        if principal_component <= Money::ZERO {
            term = ProjectedTerm::NonAmortizing;
            break;
        }
        balance -= principal_component;
        future_interest += interest;
        months += 1;
        term = ProjectedTerm::Months(months);
    }

    let after = match term {
        ProjectedTerm::Months(m) if m < tenure_months => StressStatus::Safe,
        _ => before,
    };

    Ok(Some(StressReport {
        before,
        after,
        new_remaining_term: term,
        future_interest,
    }))
}
