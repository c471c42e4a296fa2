//! Multi-class share balances gated by cap-table compliance.
//!
//! Each share class carries a compliance policy (shareholder limit, minimum
//! shareholding, divisibility). Every balance change is validated by the
//! compliance engine before it is written, and multi-entry operations commit
//! all-or-nothing through the batch coordinator.

pub mod balances;
pub mod batch;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod shared;
pub mod snapshot;

pub use balances::BalanceTable;
pub use batch::{
    BatchCoordinator, BatchOutcome, BatchPlan, ClassOutcome, ClassPlan, EntryKind, PendingBatch,
    PendingEntry,
};
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use event::{EventBus, LedgerEvent, Operation};
pub use ledger::Ledger;
pub use logging::{init_from_config, init_logging, LogFormat};
pub use registry::{ClassRecord, TokenClassRegistry};
pub use shared::SharedLedger;
pub use snapshot::{BalanceRecord, LedgerSnapshot, SNAPSHOT_VERSION};
