//! Share unit: the granularity of non-divisible share classes.
//!
//! Balances are fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw. A ledger configured with `d` share decimals
//! treats `10^d` raw units as one whole share.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// Number of raw units making up one whole share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareUnit(u128);

impl ShareUnit {
    /// One raw unit per share: every integer balance is whole.
    pub const RAW: Self = Self(1);

    /// Largest decimal count whose unit still fits in a u128.
    pub const MAX_DECIMALS: u32 = 38;

    /// Build the unit `10^decimals`.
    pub fn from_decimals(decimals: u32) -> Result<Self, TypesError> {
        10u128
            .checked_pow(decimals)
            .map(Self)
            .ok_or(TypesError::DecimalsOutOfRange(decimals))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Whether `amount` is an integer multiple of this unit. Zero is whole.
    pub fn is_whole(&self, amount: u128) -> bool {
        amount % self.0 == 0
    }
}

impl Default for ShareUnit {
    fn default() -> Self {
        Self::RAW
    }
}

impl fmt::Display for ShareUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} raw/share", self.0)
    }
}
