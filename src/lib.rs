pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod runtime;
pub mod serialization;
pub mod types;

// re-export key types
pub use config::{ClaimWindow, LedgerConfig, RepaymentPolicy};
pub use decimal::{Money, Rate, RATE_SCALE};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use ledger::LoanLedger;
pub use loan::{Loan, LoanSnapshot};
pub use runtime::{Clock, IdentitySource, InMemoryTransfer, Payout, ValueTransfer};
pub use serialization::{LedgerView, LoanView};
pub use types::{LoanId, LoanStatus, Principal, FIRST_LOAN_ID};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
