pub mod decimal;
pub mod errors;
pub mod ledger;
pub mod loan;
pub mod schedule;
pub mod simulate;
pub mod store;
pub mod summary;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, Result, StoreError};
pub use ledger::LoanLedger;
pub use loan::{Loan, Payment};
pub use schedule::{calculate_emi, calculate_interest_only, AmortizationSchedule, ScheduleRow};
pub use simulate::{forecast_prepayment, stress_simulation, PrepaymentForecast, ProjectedTerm, StressReport};
pub use store::{FinanceStore, MAX_BACKUPS};
pub use summary::{spending_insights, summarize, FinanceSummary, SpendingInsights, StressStatus};
pub use types::{InterestFrequency, LoanKind, MonthKey, PaymentNote};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
