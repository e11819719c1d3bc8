use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// ledger configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub repayment_policy: RepaymentPolicy,
    pub claim_window: ClaimWindow,
}

/// how a repayment value is compared with the amount due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentPolicy {
    /// the due amount or more; any excess goes to the lender
    AtLeastDue,
    /// exactly the due amount
    ExactOnly,
}

/// when a lender may claim collateral relative to the due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimWindow {
    /// strictly after the due date
    AfterDueDate,
    /// at the due date instant or later
    AtOrAfterDueDate,
}

impl ClaimWindow {
    pub fn is_open(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        due_date: chrono::DateTime<chrono::Utc>,
    ) -> bool {
        match self {
            ClaimWindow::AfterDueDate => now > due_date,
            ClaimWindow::AtOrAfterDueDate => now >= due_date,
        }
    }
}

impl LedgerConfig {
    /// overpayment accepted, claim strictly after due date
    pub fn standard() -> Self {
        Self {
            repayment_policy: RepaymentPolicy::AtLeastDue,
            claim_window: ClaimWindow::AfterDueDate,
        }
    }

    /// exact repayment only, claim strictly after due date
    pub fn strict() -> Self {
        Self {
            repayment_policy: RepaymentPolicy::ExactOnly,
            claim_window: ClaimWindow::AfterDueDate,
        }
    }

    /// parse configuration from json
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::InvalidConfiguration {
            message: e.to_string(),
        })
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::standard()
    }
}
