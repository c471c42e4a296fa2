//! Errors raised while constructing fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("share decimals {0} exceed the representable range")]
    DecimalsOutOfRange(u32),
}
