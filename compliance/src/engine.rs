//! Core compliance decision function.

use serde::{Deserialize, Serialize};

use crate::error::ComplianceError;
use hypershare_types::{CompliancePolicy, ShareUnit};

/// A proposed change to one account's balance in one class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceDelta {
    Credit(u128),
    Debit(u128),
}

impl BalanceDelta {
    /// The unsigned magnitude of the change.
    pub fn amount(&self) -> u128 {
        match self {
            Self::Credit(a) | Self::Debit(a) => *a,
        }
    }

    pub fn is_debit(&self) -> bool {
        matches!(self, Self::Debit(_))
    }
}

/// How a balance change moves an account across the zero boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolderDelta {
    /// Balance went from zero to positive.
    Joined,
    /// Balance went from positive to zero.
    Left,
    Unchanged,
}

impl HolderDelta {
    /// The change in holder count: +1, -1 or 0.
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Joined => 1,
            Self::Left => -1,
            Self::Unchanged => 0,
        }
    }
}

/// The outcome of a successful validation. Nothing has been applied yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub new_balance: u128,
    pub holder_delta: HolderDelta,
}

/// Validates balance changes against a class's compliance policy.
///
/// Holds only the ledger-wide share unit; all class state is passed in, so the
/// same engine can dry-run a whole batch against scratch state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComplianceEngine {
    unit: ShareUnit,
}

impl ComplianceEngine {
    pub fn new(unit: ShareUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> ShareUnit {
        self.unit
    }

    /// Decide whether `delta` may be applied to an account holding
    /// `current_balance` in a class governed by `policy` that currently has
    /// `current_holder_count` holders.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// sign/overflow, divisibility, minimum holding, shareholder limit.
    pub fn validate(
        &self,
        policy: &CompliancePolicy,
        current_balance: u128,
        delta: BalanceDelta,
        current_holder_count: u64,
    ) -> Result<Decision, ComplianceError> {
        let new_balance = match delta {
            BalanceDelta::Credit(credit) => current_balance.checked_add(credit).ok_or(
                ComplianceError::BalanceOverflow {
                    balance: current_balance,
                    credit,
                },
            )?,
            BalanceDelta::Debit(debit) => current_balance.checked_sub(debit).ok_or(
                ComplianceError::NegativeBalance {
                    balance: current_balance,
                    debit,
                },
            )?,
        };

        if policy.non_divisible && !self.unit.is_whole(new_balance) {
            return Err(ComplianceError::DivisibilityViolation {
                balance: new_balance,
                unit: self.unit.raw(),
            });
        }

        if new_balance > 0 && new_balance < policy.shareholding_minimum {
            return Err(ComplianceError::BelowMinimumHolding {
                balance: new_balance,
                minimum: policy.shareholding_minimum,
            });
        }

        let holder_delta = if current_balance == 0 && new_balance > 0 {
            if !policy.admits_holder_count(current_holder_count.saturating_add(1)) {
                return Err(ComplianceError::ShareholderLimitExceeded {
                    limit: policy.shareholder_limit,
                    current: current_holder_count,
                });
            }
            HolderDelta::Joined
        } else if current_balance > 0 && new_balance == 0 {
            HolderDelta::Left
        } else {
            HolderDelta::Unchanged
        };

        Ok(Decision {
            new_balance,
            holder_delta,
        })
    }
}
