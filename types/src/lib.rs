//! Fundamental types for the Hypershare ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account addresses, share class identifiers, compliance policies and share units.

pub mod address;
pub mod amount;
pub mod class;
pub mod error;

pub use address::AccountAddress;
pub use amount::ShareUnit;
pub use class::{ClassId, CompliancePolicy};
pub use error::TypesError;
