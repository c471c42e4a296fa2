//! Compliance rule violations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComplianceError {
    #[error("balance would go negative: debit {debit}, balance {balance}")]
    NegativeBalance { balance: u128, debit: u128 },

    #[error("balance would overflow: credit {credit}, balance {balance}")]
    BalanceOverflow { balance: u128, credit: u128 },

    #[error("balance {balance} is not a whole multiple of the share unit {unit}")]
    DivisibilityViolation { balance: u128, unit: u128 },

    #[error("balance {balance} is below the minimum shareholding {minimum}")]
    BelowMinimumHolding { balance: u128, minimum: u128 },

    #[error("shareholder limit {limit} reached ({current} holders)")]
    ShareholderLimitExceeded { limit: u64, current: u64 },
}
