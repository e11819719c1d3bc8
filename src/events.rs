use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, Principal};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LoanRequested {
        loan_id: LoanId,
        borrower: Principal,
        collateral_amount: Money,
        loan_amount: Money,
        interest_rate: Rate,
        duration_seconds: i64,
        timestamp: DateTime<Utc>,
    },
    LoanFunded {
        loan_id: LoanId,
        lender: Principal,
        amount: Money,
        due_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        borrower: Principal,
        amount: Money,
        collateral_returned: Money,
        timestamp: DateTime<Utc>,
    },
    CollateralClaimed {
        loan_id: LoanId,
        lender: Principal,
        collateral_amount: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::LoanRequested { loan_id, .. }
            | Event::LoanFunded { loan_id, .. }
            | Event::LoanRepaid { loan_id, .. }
            | Event::CollateralClaimed { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
