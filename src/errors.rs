use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, Principal};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid amount: {message}")]
    InvalidAmount {
        message: String,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidRate {
        rate: Rate,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("loan {id} already funded")]
    AlreadyFunded {
        id: LoanId,
    },

    #[error("funding amount mismatch: expected {expected}, provided {provided}")]
    AmountMismatch {
        expected: Money,
        provided: Money,
    },

    #[error("loan {id} not funded")]
    NotFunded {
        id: LoanId,
    },

    #[error("loan {id} already repaid")]
    AlreadyRepaid {
        id: LoanId,
    },

    #[error("collateral for loan {id} already claimed")]
    AlreadyClaimed {
        id: LoanId,
    },

    #[error("caller {caller} is not the borrower of loan {id}")]
    NotBorrower {
        id: LoanId,
        caller: Principal,
    },

    #[error("caller {caller} is not the lender of loan {id}")]
    NotLender {
        id: LoanId,
        caller: Principal,
    },

    #[error("insufficient repayment: due {due}, provided {provided}")]
    InsufficientRepayment {
        due: Money,
        provided: Money,
    },

    #[error("loan {id} not yet due: due date {due_date}, current time {current_time}")]
    NotYetDue {
        id: LoanId,
        due_date: chrono::DateTime<chrono::Utc>,
        current_time: chrono::DateTime<chrono::Utc>,
    },

    #[error("transfer of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        recipient: Principal,
        amount: Money,
        reason: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
