use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::{LedgerConfig, RepaymentPolicy};
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::loan::{due_date_after, repayment_due, Loan, LoanSnapshot};
use crate::runtime::{Clock, IdentitySource, Payout, ValueTransfer};
use crate::types::{LoanId, Principal, FIRST_LOAN_ID};

/// table of collateralized loans and the rules that move value between
/// borrowers, lenders and the ledger's custody
///
/// every state-changing operation stages its effects on a copy of the loan,
/// settles the outbound payouts as one batch, and only then commits the copy.
/// a failing call leaves the table, events and snapshots untouched.
pub struct LoanLedger<V: ValueTransfer> {
    config: LedgerConfig,
    loans: BTreeMap<LoanId, Loan>,
    next_id: LoanId,
    transfer: V,
    events: EventStore,
    snapshots: Vec<LoanSnapshot>,
}

impl<V: ValueTransfer> LoanLedger<V> {
    /// create an empty ledger with the standard configuration
    pub fn new(transfer: V) -> Self {
        Self::with_config(LedgerConfig::standard(), transfer)
    }

    pub fn with_config(config: LedgerConfig, transfer: V) -> Self {
        Self {
            config,
            loans: BTreeMap::new(),
            next_id: FIRST_LOAN_ID,
            transfer,
            events: EventStore::new(),
            snapshots: Vec::new(),
        }
    }

    /// lock collateral and open a loan request
    pub fn request_loan(
        &mut self,
        caller: &impl IdentitySource,
        collateral: Money,
        loan_amount: Money,
        interest_rate: Rate,
        duration_seconds: i64,
        clock: &impl Clock,
    ) -> Result<LoanId> {
        let borrower = caller.caller();

        let now = clock.now();
        validate_terms(collateral, loan_amount, interest_rate, duration_seconds, now)
            .map_err(|e| rejected("request_loan", None, &borrower, e))?;

        let id = self.next_id;
        let loan = Loan::new(
            id,
            borrower.clone(),
            collateral,
            loan_amount,
            interest_rate,
            duration_seconds,
            now,
        );

        self.next_id += 1;
        self.commit(loan, "request".to_string(), now);

        self.events.emit(Event::LoanRequested {
            loan_id: id,
            borrower: borrower.clone(),
            collateral_amount: collateral,
            loan_amount,
            interest_rate,
            duration_seconds,
            timestamp: now,
        });

        info!(
            loan_id = id,
            borrower = %borrower,
            collateral = %collateral,
            loan_amount = %loan_amount,
            interest_rate = %interest_rate,
            duration_seconds,
            "loan requested"
        );

        Ok(id)
    }

    /// fund a requested loan and forward the principal to the borrower
    pub fn fund_loan(
        &mut self,
        caller: &impl IdentitySource,
        loan_id: LoanId,
        principal: Money,
        clock: &impl Clock,
    ) -> Result<()> {
        let lender = caller.caller();

        let loan = self
            .check_funding(loan_id, principal)
            .map_err(|e| rejected("fund_loan", Some(loan_id), &lender, e))?;

        let now = clock.now();
        let mut staged = loan.clone();
        let due_date = staged
            .record_funding(lender.clone(), now)
            .map_err(|e| rejected("fund_loan", Some(loan_id), &lender, e))?;

        self.transfer
            .settle(&[Payout::new(staged.borrower.clone(), principal)])
            .map_err(|e| rejected("fund_loan", Some(loan_id), &lender, e))?;

        self.commit(staged, format!("funding: {}", principal), now);

        self.events.emit(Event::LoanFunded {
            loan_id,
            lender: lender.clone(),
            amount: principal,
            due_date,
            timestamp: now,
        });

        info!(loan_id, lender = %lender, amount = %principal, %due_date, "loan funded");

        Ok(())
    }

    /// repay a funded loan; collateral goes back to the borrower and the whole
    /// repayment value goes to the lender
    pub fn repay_loan(
        &mut self,
        caller: &impl IdentitySource,
        loan_id: LoanId,
        repayment: Money,
        clock: &impl Clock,
    ) -> Result<()> {
        let borrower = caller.caller();

        let loan = self
            .check_repayment(loan_id, &borrower, repayment)
            .map_err(|e| rejected("repay_loan", Some(loan_id), &borrower, e))?;

        let lender = loan
            .lender
            .clone()
            .ok_or(LedgerError::NotFunded { id: loan_id })
            .map_err(|e| rejected("repay_loan", Some(loan_id), &borrower, e))?;
        let collateral = loan.collateral_amount;

        let now = clock.now();
        let mut staged = loan.clone();
        staged.record_repayment(repayment);

        self.transfer
            .settle(&[
                Payout::new(borrower.clone(), collateral),
                Payout::new(lender, repayment),
            ])
            .map_err(|e| rejected("repay_loan", Some(loan_id), &borrower, e))?;

        self.commit(staged, format!("repayment: {}", repayment), now);

        self.events.emit(Event::LoanRepaid {
            loan_id,
            borrower: borrower.clone(),
            amount: repayment,
            collateral_returned: collateral,
            timestamp: now,
        });

        info!(loan_id, borrower = %borrower, amount = %repayment, collateral = %collateral, "loan repaid");

        Ok(())
    }

    /// hand the collateral of a defaulted loan to its lender
    pub fn claim_collateral(
        &mut self,
        caller: &impl IdentitySource,
        loan_id: LoanId,
        clock: &impl Clock,
    ) -> Result<()> {
        let lender = caller.caller();
        let now = clock.now();

        let loan = self
            .check_claim(loan_id, &lender, now)
            .map_err(|e| rejected("claim_collateral", Some(loan_id), &lender, e))?;

        let collateral = loan.collateral_amount;
        let mut staged = loan.clone();
        staged.record_claim();

        self.transfer
            .settle(&[Payout::new(lender.clone(), collateral)])
            .map_err(|e| rejected("claim_collateral", Some(loan_id), &lender, e))?;

        self.commit(staged, "claim".to_string(), now);

        self.events.emit(Event::CollateralClaimed {
            loan_id,
            lender: lender.clone(),
            collateral_amount: collateral,
            timestamp: now,
        });

        info!(loan_id, lender = %lender, collateral = %collateral, "collateral claimed");

        Ok(())
    }

    /// copy of a loan's current fields
    pub fn get_loan(&self, loan_id: LoanId) -> Result<Loan> {
        debug!(loan_id, "loan lookup");
        self.loans
            .get(&loan_id)
            .cloned()
            .ok_or(LedgerError::LoanNotFound { id: loan_id })
    }

    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }

    pub fn loans_by_borrower<'a>(&'a self, borrower: &'a Principal) -> impl Iterator<Item = &'a Loan> {
        self.loans.values().filter(move |l| &l.borrower == borrower)
    }

    pub fn loans_by_lender<'a>(&'a self, lender: &'a Principal) -> impl Iterator<Item = &'a Loan> {
        self.loans
            .values()
            .filter(move |l| l.lender.as_ref() == Some(lender))
    }

    /// collateral currently locked in the ledger
    pub fn collateral_held(&self) -> Money {
        self.loans
            .values()
            .filter(|l| l.holds_collateral())
            .map(|l| l.collateral_amount)
            .sum()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn transfer(&self) -> &V {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut V {
        &mut self.transfer
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn snapshots(&self) -> &[LoanSnapshot] {
        &self.snapshots
    }

    pub fn snapshots_for(&self, loan_id: LoanId) -> impl Iterator<Item = &LoanSnapshot> {
        self.snapshots.iter().filter(move |s| s.loan_id == loan_id)
    }

    fn find(&self, loan_id: LoanId) -> Result<&Loan> {
        self.loans
            .get(&loan_id)
            .ok_or(LedgerError::LoanNotFound { id: loan_id })
    }

    fn check_funding(&self, loan_id: LoanId, principal: Money) -> Result<&Loan> {
        let loan = self.find(loan_id)?;

        if loan.is_funded {
            return Err(LedgerError::AlreadyFunded { id: loan_id });
        }

        if principal != loan.loan_amount {
            return Err(LedgerError::AmountMismatch {
                expected: loan.loan_amount,
                provided: principal,
            });
        }

        Ok(loan)
    }

    fn check_repayment(&self, loan_id: LoanId, caller: &Principal, repayment: Money) -> Result<&Loan> {
        let loan = self.find(loan_id)?;

        if !loan.is_funded {
            return Err(LedgerError::NotFunded { id: loan_id });
        }
        if loan.is_repaid {
            return Err(LedgerError::AlreadyRepaid { id: loan_id });
        }
        if loan.is_claimed {
            return Err(LedgerError::AlreadyClaimed { id: loan_id });
        }
        if &loan.borrower != caller {
            return Err(LedgerError::NotBorrower {
                id: loan_id,
                caller: caller.clone(),
            });
        }

        let due = loan.repayment_due().ok_or(LedgerError::InvalidRate {
            rate: loan.interest_rate,
        })?;
        if repayment < due {
            return Err(LedgerError::InsufficientRepayment {
                due,
                provided: repayment,
            });
        }
        if self.config.repayment_policy == RepaymentPolicy::ExactOnly && repayment != due {
            return Err(LedgerError::AmountMismatch {
                expected: due,
                provided: repayment,
            });
        }

        Ok(loan)
    }

    fn check_claim(
        &self,
        loan_id: LoanId,
        caller: &Principal,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<&Loan> {
        let loan = self.find(loan_id)?;

        if !loan.is_funded {
            return Err(LedgerError::NotFunded { id: loan_id });
        }
        if loan.is_repaid {
            return Err(LedgerError::AlreadyRepaid { id: loan_id });
        }
        if loan.is_claimed {
            return Err(LedgerError::AlreadyClaimed { id: loan_id });
        }
        if loan.lender.as_ref() != Some(caller) {
            return Err(LedgerError::NotLender {
                id: loan_id,
                caller: caller.clone(),
            });
        }

        let due_date = loan.due_date.ok_or(LedgerError::NotFunded { id: loan_id })?;
        if !self.config.claim_window.is_open(now, due_date) {
            return Err(LedgerError::NotYetDue {
                id: loan_id,
                due_date,
                current_time: now,
            });
        }

        Ok(loan)
    }

    fn commit(&mut self, loan: Loan, trigger: String, now: chrono::DateTime<chrono::Utc>) {
        self.snapshots.push(LoanSnapshot::capture(&loan, trigger, now));
        self.loans.insert(loan.id, loan);
    }
}

fn validate_terms(
    collateral: Money,
    loan_amount: Money,
    interest_rate: Rate,
    duration_seconds: i64,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    if !collateral.is_positive() {
        return Err(LedgerError::InvalidAmount {
            message: format!("collateral must be positive, got {}", collateral),
        });
    }
    if !loan_amount.is_positive() {
        return Err(LedgerError::InvalidAmount {
            message: format!("loan amount must be positive, got {}", loan_amount),
        });
    }
    if duration_seconds <= 0 {
        return Err(LedgerError::InvalidAmount {
            message: format!("duration must be positive, got {}s", duration_seconds),
        });
    }
    if due_date_after(now, duration_seconds).is_none() {
        return Err(LedgerError::InvalidAmount {
            message: format!("duration {}s puts the due date out of range", duration_seconds),
        });
    }
    if interest_rate.is_negative() {
        return Err(LedgerError::InvalidRate { rate: interest_rate });
    }
    // a loan whose due amount cannot be represented could never be repaid
    if repayment_due(loan_amount, interest_rate).is_none() {
        return Err(LedgerError::InvalidRate { rate: interest_rate });
    }
    Ok(())
}

fn rejected(
    operation: &'static str,
    loan_id: Option<LoanId>,
    caller: &Principal,
    err: LedgerError,
) -> LedgerError {
    warn!(operation, ?loan_id, caller = %caller, error = %err, "call rejected");
    err
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::runtime::InMemoryTransfer;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Request { party: usize, collateral: i64, amount: i64, rate: i64, duration: i64 },
        Fund { party: usize, loan: u64, delta: i64 },
        Repay { party: usize, loan: u64, extra: i64 },
        Claim { party: usize, loan: u64 },
        Advance { seconds: i64 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4, 0i64..500, 0i64..500, -2i64..50, -5i64..5_000).prop_map(
                |(party, collateral, amount, rate, duration)| Op::Request { party, collateral, amount, rate, duration }
            ),
            (0usize..4, 1u64..8, -1i64..2).prop_map(|(party, loan, delta)| Op::Fund { party, loan, delta }),
            (0usize..4, 1u64..8, -1i64..3).prop_map(|(party, loan, extra)| Op::Repay { party, loan, extra }),
            (0usize..4, 1u64..8).prop_map(|(party, loan)| Op::Claim { party, loan }),
            (0i64..4_000).prop_map(|seconds| Op::Advance { seconds }),
        ]
    }

    fn party(i: usize) -> Principal {
        Principal::new(format!("party-{}", i))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: value received by the ledger always equals value paid
        /// out plus collateral still held, and lifecycle flags never reset.
        #[test]
        fn value_is_conserved_and_flags_are_monotonic(
            ops in prop::collection::vec(op_strategy(), 1..60)
        ) {
            let time = SafeTimeProvider::new(TimeSource::Test(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            ));
            let control = time.test_control().unwrap();
            let mut ledger = LoanLedger::new(InMemoryTransfer::new());
            let mut received = Money::ZERO;
            let mut issued: Vec<LoanId> = Vec::new();

            for op in ops {
                let before: Vec<Loan> = ledger.loans().cloned().collect();

                match op {
                    Op::Request { party: p, collateral, amount, rate, duration } => {
                        let collateral = Money::from_major(collateral);
                        if let Ok(id) = ledger.request_loan(
                            &party(p), collateral, Money::from_major(amount), Rate::from_scalar(rate), duration, &time,
                        ) {
                            prop_assert!(!issued.contains(&id));
                            prop_assert_eq!(id, issued.len() as LoanId + 1);
                            issued.push(id);
                            received += collateral;
                        }
                    }
                    Op::Fund { party: p, loan, delta } => {
                        if let Ok(existing) = ledger.get_loan(loan) {
                            let value = existing.loan_amount + Money::from_major(delta);
                            if ledger.fund_loan(&party(p), loan, value, &time).is_ok() {
                                received += value;
                            }
                        }
                    }
                    Op::Repay { party: p, loan, extra } => {
                        if let Ok(existing) = ledger.get_loan(loan) {
                            let value = existing.repayment_due().unwrap() + Money::from_major(extra);
                            if ledger.repay_loan(&party(p), loan, value, &time).is_ok() {
                                received += value;
                            }
                        }
                    }
                    Op::Claim { party: p, loan } => {
                        let _ = ledger.claim_collateral(&party(p), loan, &time);
                    }
                    Op::Advance { seconds } => {
                        control.advance(Duration::seconds(seconds));
                    }
                }

                prop_assert_eq!(
                    received,
                    ledger.transfer().total_paid_out() + ledger.collateral_held()
                );

                for old in &before {
                    let now = ledger.get_loan(old.id).unwrap();
                    prop_assert!(now.is_funded || !old.is_funded);
                    prop_assert!(now.is_repaid || !old.is_repaid);
                    prop_assert!(now.is_claimed || !old.is_claimed);
                    if old.is_funded {
                        prop_assert_eq!(now.due_date, old.due_date);
                        prop_assert_eq!(&now.lender, &old.lender);
                    }
                }

                for loan in ledger.loans() {
                    prop_assert!(!(loan.is_repaid && loan.is_claimed));
                    prop_assert!(loan.is_funded || (!loan.is_repaid && !loan.is_claimed));
                }
            }
        }
    }
}
