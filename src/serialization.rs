/// serialization support for the ledger
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::ledger::LoanLedger;
use crate::loan::Loan;
use crate::runtime::ValueTransfer;
use crate::types::{LoanId, LoanStatus, Principal};

/// serializable view of a single loan
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub status: LoanStatus,
    pub borrower: Principal,
    pub lender: Option<Principal>,
    pub terms: TermsView,
    pub dates: DatesView,
    pub amount_repaid: Option<Money>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TermsView {
    pub collateral_amount: Money,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    /// absent when principal plus interest is out of decimal range
    pub repayment_due: Option<Money>,
    pub duration_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatesView {
    pub requested_at: DateTime<Utc>,
    pub funded_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        LoanView {
            id: loan.id,
            status: loan.status(),
            borrower: loan.borrower.clone(),
            lender: loan.lender.clone(),
            terms: TermsView {
                collateral_amount: loan.collateral_amount,
                loan_amount: loan.loan_amount,
                interest_rate: loan.interest_rate,
                repayment_due: loan.repayment_due(),
                duration_seconds: loan.duration_seconds,
            },
            dates: DatesView {
                requested_at: loan.requested_at,
                funded_at: loan.funded_at,
                due_date: loan.due_date,
            },
            amount_repaid: loan.amount_repaid,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// serializable view of the whole ledger
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerView {
    pub loan_count: usize,
    pub collateral_held: Money,
    pub loans: Vec<LoanView>,
}

impl LedgerView {
    pub fn from_ledger<V: ValueTransfer>(ledger: &LoanLedger<V>) -> Self {
        LedgerView {
            loan_count: ledger.loan_count(),
            collateral_held: ledger.collateral_held(),
            loans: ledger.loans().map(LoanView::from_loan).collect(),
        }
    }
}

impl<V: ValueTransfer> LoanLedger<V> {
    /// get json representation of the current table
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&LedgerView::from_ledger(self))
            .unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    /// short alias for json output
    pub fn json(&self) -> String {
        self.to_json_pretty()
    }
}
