use serde::{Deserialize, Serialize};
use std::fmt;

/// identifier of a loan, dense from 1 and never reused
pub type LoanId = u64;

/// first id handed out by a fresh ledger
pub const FIRST_LOAN_ID: LoanId = 1;

/// calling party as reported by the runtime's identity source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Principal(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Principal::new(s)
    }
}

/// loan status, derived from the loan's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// collateral locked, waiting for a lender
    Requested,
    /// principal delivered, repayment outstanding
    Funded,
    /// repaid and collateral returned
    Repaid,
    /// defaulted and collateral taken by the lender
    Claimed,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Repaid | LoanStatus::Claimed)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoanStatus::Requested => "requested",
            LoanStatus::Funded => "funded",
            LoanStatus::Repaid => "repaid",
            LoanStatus::Claimed => "claimed",
        };
        f.write_str(label)
    }
}
