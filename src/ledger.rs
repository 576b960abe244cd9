use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::loan::{Loan, Payment};
use crate::types::{LoanKind, MonthKey, PaymentNote};

/// the persisted finance document: every loan and its payment history
///
/// loans are addressed by position; there is no stable id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLedger {
    #[serde(default)]
    pub loans: Vec<Loan>,
}

impl LoanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    /// loan at the given position
    pub fn loan(&self, index: usize) -> Result<&Loan> {
        self.loans
            .get(index)
            .ok_or(LedgerError::LoanIndexOutOfRange {
                index,
                len: self.loans.len(),
            })
    }

    fn loan_mut(&mut self, index: usize) -> Result<&mut Loan> {
        let len = self.loans.len();
        self.loans
            .get_mut(index)
            .ok_or(LedgerError::LoanIndexOutOfRange { index, len })
    }

    /// add a loan with validated terms, returning its position
    pub fn add_loan(
        &mut self,
        name: impl Into<String>,
        principal: Money,
        rate: Rate,
        start_date: NaiveDate,
        kind: LoanKind,
        time: &SafeTimeProvider,
    ) -> Result<usize> {
        let today = time.now().date_naive();
        let loan = Loan::new(name, principal, rate, start_date, kind, today)?;
        info!(name = %loan.name, principal = %loan.principal, "loan added");
        self.loans.push(loan);
        Ok(self.loans.len() - 1)
    }

    /// remove a loan by position
    pub fn delete_loan(&mut self, index: usize) -> Result<Loan> {
        if index >= self.loans.len() {
            return Err(LedgerError::LoanIndexOutOfRange {
                index,
                len: self.loans.len(),
            });
        }
        let loan = self.loans.remove(index);
        info!(name = %loan.name, "loan deleted");
        Ok(loan)
    }

    /// validate and commit one payment event onto a loan
    ///
    /// the payment is dated to the first day of `month_key` (defaulting to
    /// the current month); for bank loans at most one EMI may be booked per
    /// calendar month
    pub fn record_payment(
        &mut self,
        index: usize,
        amount: Money,
        note: PaymentNote,
        month_key: Option<MonthKey>,
        time: &SafeTimeProvider,
    ) -> Result<Payment> {
        let today = time.now().date_naive();

        if !amount.is_positive() {
            return Err(LedgerError::InvalidPaymentAmount { amount });
        }

        let loan = self.loan_mut(index)?;

        let month = month_key.unwrap_or_else(|| MonthKey::from_date(today));
        let payment_date = month.first_day();

        if payment_date > today {
            return Err(LedgerError::FutureDatedPayment { date: payment_date });
        }

        if loan.kind.is_bank() && note == PaymentNote::Emi {
            let booked = loan
                .payments
                .iter()
                .any(|p| p.note == PaymentNote::Emi && month.contains(p.date));
            if booked {
                return Err(LedgerError::DuplicateEmi { month });
            }
        }

        let payment = Payment {
            date: payment_date,
            amount,
            note,
        };
        loan.payments.push(payment);
        loan.recompute_principal();

        info!(
            loan = %loan.name,
            amount = %amount,
            note = %note,
            month = %month,
            "payment recorded"
        );
        Ok(payment)
    }

    /// pop the most recent payment off a loan, replaying the balance so the
    /// undo is exact for every payment note
    ///
    /// returns `Ok(None)` when the loan has no payments
    pub fn undo_last_payment(&mut self, index: usize) -> Result<Option<Payment>> {
        let loan = self.loan_mut(index)?;
        let popped = loan.payments.pop();
        if let Some(payment) = popped {
            loan.recompute_principal();
            info!(
                loan = %loan.name,
                amount = %payment.amount,
                note = %payment.note,
                "last payment undone"
            );
        }
        Ok(popped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InterestFrequency;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn clock(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ledger_with_bank_loan(time: &SafeTimeProvider) -> LoanLedger {
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
                time,
            )
            .unwrap();
        ledger
    }

    #[test]
    fn test_first_emi_payment_reduces_principal() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        ledger
            .record_payment(
                0,
                Money::from_major(8_885),
                PaymentNote::Emi,
                Some("2024-02".parse().unwrap()),
                &time,
            )
            .unwrap();

        let loan = ledger.loan(0).unwrap();
        assert!(loan.principal < Money::from_major(100_000));
        assert_eq!(loan.emis_paid(), 1);
    }

    #[test]
    fn test_duplicate_emi_same_month_rejected() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        ledger
            .record_payment(
                0,
                Money::from_major(8_885),
                PaymentNote::Emi,
                Some("2024-02".parse().unwrap()),
                &time,
            )
            .unwrap();

        let second = ledger.record_payment(
            0,
            Money::from_major(8_885),
            PaymentNote::Emi,
            Some("2024-02".parse().unwrap()),
            &time,
        );
        assert!(matches!(second, Err(LedgerError::DuplicateEmi { .. })));

        // rejected operation leaves the ledger unchanged
        assert_eq!(ledger.loan(0).unwrap().payments.len(), 1);
    }

    #[test]
    fn test_future_dated_payment_rejected() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        let result = ledger.record_payment(
            0,
            Money::from_major(8_885),
            PaymentNote::Emi,
            Some("2024-09".parse().unwrap()),
            &time,
        );
        assert!(matches!(result, Err(LedgerError::FutureDatedPayment { .. })));
    }

    #[test]
    fn test_month_key_defaults_to_current_month() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        let payment = ledger
            .record_payment(0, Money::from_major(8_885), PaymentNote::Emi, None, &time)
            .unwrap();
        assert_eq!(payment.date, date(2024, 6, 1));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        let result =
            ledger.record_payment(0, Money::ZERO, PaymentNote::Emi, None, &time);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_interest_payment_on_interest_only_loan() {
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

        let due = ledger.loan(0).unwrap().interest_only_due().unwrap();
        assert_eq!(due, Money::from_major(1_000));

        ledger
            .record_payment(
                0,
                due,
                PaymentNote::Interest,
                Some("2024-02".parse().unwrap()),
                &time,
            )
            .unwrap();

        let loan = ledger.loan(0).unwrap();
        assert_eq!(loan.principal, Money::from_major(100_000));
        assert_eq!(loan.payments.len(), 1);
        assert_eq!(loan.payments[0].note, PaymentNote::Interest);
    }

    #[test]
    fn test_undo_is_symmetric_for_emi() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        let before = ledger.loan(0).unwrap().principal;
        ledger
            .record_payment(0, Money::from_major(8_885), PaymentNote::Emi, None, &time)
            .unwrap();
        assert_eq!(
            ledger.loan(0).unwrap().principal,
            Money::from_decimal(dec!(92115))
        );

        let popped = ledger.undo_last_payment(0).unwrap();
        assert!(popped.is_some());
        assert_eq!(ledger.loan(0).unwrap().principal, before);
    }

    #[test]
    fn test_undo_restores_principal_payment() {
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

        ledger
            .record_payment(
                0,
                Money::from_major(25_000),
                PaymentNote::Principal,
                None,
                &time,
            )
            .unwrap();
        assert_eq!(ledger.loan(0).unwrap().principal, Money::from_major(75_000));

        ledger.undo_last_payment(0).unwrap();
        assert_eq!(
            ledger.loan(0).unwrap().principal,
            Money::from_major(100_000)
        );
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);
        assert!(ledger.undo_last_payment(0).unwrap().is_none());
    }

    #[test]
    fn test_index_out_of_range() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        assert!(matches!(
            ledger.delete_loan(5),
            Err(LedgerError::LoanIndexOutOfRange { index: 5, len: 1 })
        ));
        assert!(matches!(
            ledger.record_payment(3, Money::from_major(1), PaymentNote::Emi, None, &time),
            Err(LedgerError::LoanIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_delete_loan_by_position() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);
        let removed = ledger.delete_loan(0).unwrap();
        assert_eq!(removed.name, "Home Loan");
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_principal_never_exceeds_taken_amount() {
        let time = clock(2024, 6, 15);
        let mut ledger = ledger_with_bank_loan(&time);

        for month in ["2024-01", "2024-02", "2024-03", "2024-04"] {
            ledger
                .record_payment(
                    0,
                    Money::from_major(8_885),
                    PaymentNote::Emi,
                    Some(month.parse().unwrap()),
                    &time,
                )
                .unwrap();
            let loan = ledger.loan(0).unwrap();
            assert!(loan.principal >= Money::ZERO);
            assert!(loan.principal <= loan.taken_amount);
        }
    }
}
