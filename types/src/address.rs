//! Account address type with `0x` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A 20-byte account address, rendered as `0x` followed by 40 lowercase hex digits.
///
/// Ordering is bytewise, which gives holder listings and snapshots a stable order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountAddress([u8; 20]);

impl AccountAddress {
    /// The standard prefix for rendered addresses.
    pub const PREFIX: &'static str = "0x";

    /// The all-zero address. Never a valid holder.
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for AccountAddress {
    type Err = TypesError;

    /// Parse a `0x`-prefixed, 40-digit hex address. Either hex case is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| TypesError::InvalidAddress(s.to_string()))?;
        if digits.len() != 40 {
            return Err(TypesError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl From<[u8; 20]> for AccountAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
