use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::runtime::{Payout, ValueTransfer};
use crate::types::Principal;

/// in-memory transfer channel
///
/// credits recipients in a balance book and keeps a journal of every payout.
/// recipients can be marked as refusing funds to exercise rollback paths.
#[derive(Debug, Default)]
pub struct InMemoryTransfer {
    balances: HashMap<Principal, Money>,
    journal: Vec<Payout>,
    refusing: HashSet<Principal>,
}

impl InMemoryTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// make every future payout to this principal fail
    pub fn refuse(&mut self, principal: &Principal) {
        self.refusing.insert(principal.clone());
    }

    /// accept payouts to this principal again
    pub fn accept(&mut self, principal: &Principal) {
        self.refusing.remove(principal);
    }

    /// total received by a principal
    pub fn balance_of(&self, principal: &Principal) -> Money {
        self.balances.get(principal).copied().unwrap_or(Money::ZERO)
    }

    pub fn journal(&self) -> &[Payout] {
        &self.journal
    }

    /// sum of all payouts ever settled
    pub fn total_paid_out(&self) -> Money {
        self.journal.iter().map(|p| p.amount).sum()
    }
}

impl ValueTransfer for InMemoryTransfer {
    fn settle(&mut self, payouts: &[Payout]) -> Result<()> {
        // validate the whole batch before crediting anyone
        for payout in payouts {
            if self.refusing.contains(&payout.recipient) {
                warn!(recipient = %payout.recipient, amount = %payout.amount, "payout refused");
                return Err(LedgerError::TransferFailed {
                    recipient: payout.recipient.clone(),
                    amount: payout.amount,
                    reason: "recipient refuses funds".to_string(),
                });
            }
            if payout.amount.is_negative() {
                return Err(LedgerError::TransferFailed {
                    recipient: payout.recipient.clone(),
                    amount: payout.amount,
                    reason: "negative payout".to_string(),
                });
            }
        }

        for payout in payouts {
            *self.balances.entry(payout.recipient.clone()).or_insert(Money::ZERO) += payout.amount;
            self.journal.push(payout.clone());
            debug!(recipient = %payout.recipient, amount = %payout.amount, "payout settled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_credits_recipients() {
        let mut bank = InMemoryTransfer::new();
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");

        bank.settle(&[
            Payout::new(alice.clone(), Money::from_major(10)),
            Payout::new(bob.clone(), Money::from_major(4)),
            Payout::new(alice.clone(), Money::from_major(1)),
        ])
        .unwrap();

        assert_eq!(bank.balance_of(&alice), Money::from_major(11));
        assert_eq!(bank.balance_of(&bob), Money::from_major(4));
        assert_eq!(bank.journal().len(), 3);
        assert_eq!(bank.total_paid_out(), Money::from_major(15));
    }

    #[test]
    fn test_refused_batch_credits_nobody() {
        let mut bank = InMemoryTransfer::new();
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");
        bank.refuse(&bob);

        let err = bank
            .settle(&[
                Payout::new(alice.clone(), Money::from_major(10)),
                Payout::new(bob.clone(), Money::from_major(4)),
            ])
            .unwrap_err();

        assert!(matches!(err, LedgerError::TransferFailed { ref recipient, .. } if *recipient == bob));
        assert_eq!(bank.balance_of(&alice), Money::ZERO);
        assert!(bank.journal().is_empty());

        bank.accept(&bob);
        bank.settle(&[Payout::new(bob.clone(), Money::from_major(4))]).unwrap();
        assert_eq!(bank.balance_of(&bob), Money::from_major(4));
    }
}
