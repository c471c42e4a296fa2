use thiserror::Error;

use hypershare_compliance::ComplianceError;
use hypershare_types::{AccountAddress, ClassId};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("unknown share class {0}")]
    UnknownClass(ClassId),

    #[error("insufficient balance for {account} in class {class_id}: need {needed}, have {available}")]
    InsufficientBalance {
        position: usize,
        account: AccountAddress,
        class_id: ClassId,
        needed: u128,
        available: u128,
    },

    #[error("arity mismatch: {accounts} accounts, {amounts} amounts")]
    ArityMismatch { accounts: usize, amounts: usize },

    #[error("self transfer not allowed for {0}")]
    SelfTransferNotAllowed(AccountAddress),

    #[error("batch of {entries} entries exceeds the limit of {max}")]
    BatchTooLarge { entries: usize, max: usize },

    #[error("entry {position} ({account} in class {class_id}) rejected: {source}")]
    Compliance {
        position: usize,
        account: AccountAddress,
        class_id: ClassId,
        #[source]
        source: ComplianceError,
    },

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("ledger lock poisoned")]
    Poisoned,
}

impl LedgerError {
    /// The compliance rule that rejected the operation, if any.
    pub fn compliance(&self) -> Option<&ComplianceError> {
        match self {
            Self::Compliance { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Errors caused by malformed calls rather than by the cap-table rules.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameters(_)
                | Self::UnknownClass(_)
                | Self::ArityMismatch { .. }
                | Self::SelfTransferNotAllowed(_)
                | Self::BatchTooLarge { .. }
        )
    }

    /// Business-rule rejections: the call was well formed but the ledger refused it.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::Compliance { .. } | Self::InsufficientBalance { .. }
        )
    }
}
