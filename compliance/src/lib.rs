//! Cap-table rule engine for Hypershare share classes.
//!
//! Every balance change a ledger wants to make is first put to the
//! [`ComplianceEngine`], which checks it against the class policy:
//! - shareholder limit (number of accounts with a non-zero balance)
//! - minimum shareholding (no balance strictly between 0 and the floor)
//! - divisibility (non-divisible classes hold whole share units only)
//!
//! The engine is pure. It returns a [`Decision`] describing the new balance and
//! the holder-set change; applying it is the caller's job.

pub mod engine;
pub mod error;

pub use engine::{BalanceDelta, ComplianceEngine, Decision, HolderDelta};
pub use error::ComplianceError;
