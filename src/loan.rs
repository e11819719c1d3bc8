use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::{LoanId, LoanStatus, Principal};

/// loan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    // identification
    pub id: LoanId,
    pub borrower: Principal,
    pub lender: Option<Principal>,

    // terms
    pub collateral_amount: Money,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub duration_seconds: i64,

    // dates
    pub requested_at: DateTime<Utc>,
    pub funded_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,

    // lifecycle flags, only ever set
    pub is_funded: bool,
    pub is_repaid: bool,
    pub is_claimed: bool,

    // settlement
    pub amount_repaid: Option<Money>,
}

impl Loan {
    /// create a freshly requested loan
    pub fn new(
        id: LoanId,
        borrower: Principal,
        collateral_amount: Money,
        loan_amount: Money,
        interest_rate: Rate,
        duration_seconds: i64,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            borrower,
            lender: None,
            collateral_amount,
            loan_amount,
            interest_rate,
            duration_seconds,
            requested_at,
            funded_at: None,
            due_date: None,
            is_funded: false,
            is_repaid: false,
            is_claimed: false,
            amount_repaid: None,
        }
    }

    /// principal plus fixed-term simple interest, `None` past the decimal range
    pub fn repayment_due(&self) -> Option<Money> {
        repayment_due(self.loan_amount, self.interest_rate)
    }

    pub fn status(&self) -> LoanStatus {
        match (self.is_funded, self.is_repaid, self.is_claimed) {
            (_, true, _) => LoanStatus::Repaid,
            (_, _, true) => LoanStatus::Claimed,
            (true, _, _) if self.lender.is_some() => LoanStatus::Funded,
            _ => LoanStatus::Requested,
        }
    }

    /// collateral still in ledger custody
    pub fn holds_collateral(&self) -> bool {
        !self.is_repaid && !self.is_claimed
    }

    /// funded, unsettled and past its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => self.status() == LoanStatus::Funded && now > due,
            None => false,
        }
    }

    /// mark funded and return the due date, which is fixed here and never moved
    pub(crate) fn record_funding(&mut self, lender: Principal, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let due_date = due_date_after(now, self.duration_seconds).ok_or_else(|| LedgerError::InvalidAmount {
            message: format!("duration {}s from {} is past the last representable date", self.duration_seconds, now),
        })?;

        self.lender = Some(lender);
        self.is_funded = true;
        self.funded_at = Some(now);
        self.due_date = Some(due_date);
        Ok(due_date)
    }

    pub(crate) fn record_repayment(&mut self, amount: Money) {
        self.is_repaid = true;
        self.amount_repaid = Some(amount);
    }

    pub(crate) fn record_claim(&mut self) {
        self.is_claimed = true;
    }
}

pub fn repayment_due(loan_amount: Money, interest_rate: Rate) -> Option<Money> {
    loan_amount
        .simple_interest(interest_rate)
        .and_then(|interest| loan_amount.checked_add(interest))
}

/// `start + duration_seconds`, `None` when either the duration or the
/// resulting instant is out of chrono's range
pub fn due_date_after(start: DateTime<Utc>, duration_seconds: i64) -> Option<DateTime<Utc>> {
    chrono::Duration::try_seconds(duration_seconds).and_then(|d| start.checked_add_signed(d))
}

/// loan snapshot for the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub snapshot_id: Uuid,
    pub loan_id: LoanId,
    pub timestamp: DateTime<Utc>,
    pub loan: Loan,
    pub trigger: String,
}

impl LoanSnapshot {
    pub fn capture(loan: &Loan, trigger: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            loan_id: loan.id,
            timestamp,
            loan: loan.clone(),
            trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_loan() -> Loan {
        Loan::new(
            1,
            Principal::new("borrower"),
            Money::from_major(100),
            Money::from_major(100),
            Rate::from_scalar(5),
            864_000,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_new_loan_is_requested() {
        let loan = sample_loan();

        assert_eq!(loan.status(), LoanStatus::Requested);
        assert!(loan.lender.is_none());
        assert!(loan.due_date.is_none());
        assert!(!loan.is_funded && !loan.is_repaid && !loan.is_claimed);
        assert!(loan.holds_collateral());
    }

    #[test]
    fn test_repayment_due() {
        let loan = sample_loan();
        assert_eq!(loan.repayment_due(), Some(Money::from_major(105)));

        let mut fractional = sample_loan();
        fractional.loan_amount = Money::from_major(3);
        fractional.interest_rate = Rate::from_scalar(1);
        assert_eq!(fractional.repayment_due(), Some(Money::from_decimal(dec!(3.03))));

        let mut huge = sample_loan();
        huge.loan_amount = Money::from_major(i64::MAX);
        huge.interest_rate = Rate::from_scalar(i64::MAX);
        assert_eq!(huge.repayment_due(), None);
    }

    #[test]
    fn test_funding_fixes_due_date() {
        let mut loan = sample_loan();
        let funded_at = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();

        let due = loan.record_funding(Principal::new("lender"), funded_at).unwrap();

        assert_eq!(loan.status(), LoanStatus::Funded);
        assert_eq!(due, funded_at + chrono::Duration::seconds(864_000));
        assert_eq!(loan.due_date, Some(due));
        assert!(!loan.is_overdue(funded_at + chrono::Duration::seconds(864_000)));
        assert!(loan.is_overdue(funded_at + chrono::Duration::seconds(864_001)));
    }

    #[test]
    fn test_funding_out_of_date_range() {
        let mut loan = sample_loan();
        loan.duration_seconds = i64::MAX;
        let before = loan.clone();

        let err = loan
            .record_funding(Principal::new("lender"), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert_eq!(loan, before);
    }

    #[test]
    fn test_due_date_after_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(due_date_after(start, 60), Some(start + chrono::Duration::seconds(60)));
        assert_eq!(due_date_after(start, i64::MAX), None);
        // fits a duration, but not a date
        assert_eq!(due_date_after(start, i64::MAX / 1000), None);
        assert_eq!(due_date_after(DateTime::<Utc>::MAX_UTC, 1), None);
    }

    #[test]
    fn test_terminal_states() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut repaid = sample_loan();
        repaid.record_funding(Principal::new("lender"), start).unwrap();
        repaid.record_repayment(Money::from_major(105));
        assert_eq!(repaid.status(), LoanStatus::Repaid);
        assert!(repaid.status().is_terminal());
        assert!(!repaid.holds_collateral());
        assert!(!repaid.is_overdue(start + chrono::Duration::days(365)));

        let mut claimed = sample_loan();
        claimed.record_funding(Principal::new("lender"), start).unwrap();
        claimed.record_claim();
        assert_eq!(claimed.status(), LoanStatus::Claimed);
        assert!(!claimed.is_repaid);
        assert!(!claimed.holds_collateral());
    }

    #[test]
    fn test_snapshot_copies_loan() {
        let loan = sample_loan();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let snapshot = LoanSnapshot::capture(&loan, "request".to_string(), at);

        assert_eq!(snapshot.loan_id, 1);
        assert_eq!(snapshot.loan, loan);
        assert_eq!(snapshot.timestamp, at);
    }
}
