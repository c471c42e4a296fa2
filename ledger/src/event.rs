//! Events emitted after ledger operations commit, for subscribers.

use std::fmt;

use hypershare_types::{AccountAddress, ClassId, CompliancePolicy};

/// The public operation that produced an event or a rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    CreateClass,
    Mint,
    MintBatch,
    Transfer,
    TransferBatch,
    Burn,
    BurnBatch,
    ApplyBatch,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateClass => "create_class",
            Self::Mint => "mint",
            Self::MintBatch => "mint_batch",
            Self::Transfer => "transfer",
            Self::TransferBatch => "transfer_batch",
            Self::Burn => "burn",
            Self::BurnBatch => "burn_batch",
            Self::ApplyBatch => "apply_batch",
        };
        f.write_str(name)
    }
}

/// Something that happened to the cap table, delivered through the [`EventBus`].
///
/// A committed operation emits its `Minted`/`Transferred`/`Burned` events
/// first, then `HolderJoined`/`HolderLeft` for each zero crossing, and a
/// batch call ends with `BatchCommitted`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A share class was registered.
    ClassCreated {
        class_id: ClassId,
        policy: CompliancePolicy,
    },
    /// New shares were issued to an account.
    Minted {
        class_id: ClassId,
        account: AccountAddress,
        amount: u128,
    },
    /// Shares were destroyed.
    Burned {
        class_id: ClassId,
        account: AccountAddress,
        amount: u128,
    },
    /// Shares moved between two accounts.
    Transferred {
        class_id: ClassId,
        from: AccountAddress,
        to: AccountAddress,
        amount: u128,
    },
    /// A multi-entry operation committed as one unit.
    BatchCommitted {
        operation: Operation,
        class_ids: Vec<ClassId>,
        entries: usize,
        memo: Vec<u8>,
    },
    /// An account's balance went from zero to positive.
    HolderJoined {
        class_id: ClassId,
        account: AccountAddress,
    },
    /// An account's balance went to zero.
    HolderLeft {
        class_id: ClassId,
        account: AccountAddress,
    },
    /// An operation was refused; nothing changed.
    OperationRejected {
        operation: Operation,
        reason: String,
    },
}

/// Fans each ledger event out to every registered listener.
///
/// Listeners run inline inside the ledger operation; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&LedgerEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
