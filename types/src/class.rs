//! Share class identifiers and their compliance policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential identifier of a share class, assigned from 0 upwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(u64);

impl ClassId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClassId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The cap-table rules governing a single share class.
///
/// Immutable once the class is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompliancePolicy {
    /// Maximum number of accounts holding a non-zero balance. 0 means unlimited.
    pub shareholder_limit: u64,

    /// Smallest non-zero balance (raw units) a holder may carry.
    pub shareholding_minimum: u128,

    /// Balances must be whole multiples of the ledger's share unit.
    pub non_divisible: bool,
}

impl CompliancePolicy {
    pub fn new(shareholder_limit: u64, shareholding_minimum: u128, non_divisible: bool) -> Self {
        Self {
            shareholder_limit,
            shareholding_minimum,
            non_divisible,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.shareholder_limit == 0
    }

    /// Whether a class with this policy may carry `holders` shareholders.
    pub fn admits_holder_count(&self, holders: u64) -> bool {
        self.is_unlimited() || holders <= self.shareholder_limit
    }

    /// Whether `balance` satisfies the minimum-holding floor (zero always does).
    pub fn admits_balance(&self, balance: u128) -> bool {
        balance == 0 || balance >= self.shareholding_minimum
    }
}

impl fmt::Display for CompliancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "limit={} minimum={} non_divisible={}",
            self.shareholder_limit, self.shareholding_minimum, self.non_divisible
        )
    }
}
