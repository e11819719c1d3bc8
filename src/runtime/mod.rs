//! capabilities the ledger borrows from its host runtime
//!
//! the ledger never decides who is calling, what time it is, or how value
//! reaches a party. it asks these traits and trusts the answer.

pub mod memory;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::types::Principal;

pub use memory::InMemoryTransfer;

/// supplies the calling principal
pub trait IdentitySource {
    fn caller(&self) -> Principal;
}

impl IdentitySource for Principal {
    fn caller(&self) -> Principal {
        self.clone()
    }
}

/// supplies the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl Clock for SafeTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        SafeTimeProvider::now(self)
    }
}

/// one outbound transfer staged by a ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub recipient: Principal,
    pub amount: Money,
}

impl Payout {
    pub fn new(recipient: Principal, amount: Money) -> Self {
        Self { recipient, amount }
    }
}

/// moves value out of the ledger's custody
pub trait ValueTransfer {
    /// apply every payout or none of them
    ///
    /// an error means no recipient was credited and the calling operation
    /// must be abandoned.
    fn settle(&mut self, payouts: &[Payout]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;

    #[test]
    fn test_principal_is_its_own_identity() {
        let alice = Principal::new("alice");
        assert_eq!(alice.caller(), alice);
    }

    #[test]
    fn test_time_provider_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let time = SafeTimeProvider::new(TimeSource::Test(start));
        let control = time.test_control().unwrap();

        let clock: &dyn Clock = &time;
        assert_eq!(clock.now(), start);

        control.advance(chrono::Duration::seconds(90));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(90));
    }
}
