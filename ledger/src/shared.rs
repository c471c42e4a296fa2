//! Thread-safe handle serializing every operation on one ledger.

use std::sync::{Arc, Mutex};

use crate::batch::BatchOutcome;
use crate::error::LedgerError;
use crate::event::LedgerEvent;
use crate::ledger::Ledger;
use hypershare_types::{AccountAddress, ClassId, CompliancePolicy};

/// A cloneable handle to a single [`Ledger`].
///
/// Each call takes the lock once and runs to commit or abort before releasing
/// it, so no two operations interleave their read-modify-write cycles.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut Ledger) -> Result<R, LedgerError>) -> Result<R, LedgerError> {
        let mut guard = self.inner.lock().map_err(|_| LedgerError::Poisoned)?;
        f(&mut *guard)
    }

    pub fn subscribe(&self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) -> Result<(), LedgerError> {
        self.with(|ledger| {
            ledger.subscribe(listener);
            Ok(())
        })
    }

    pub fn create_class(
        &self,
        shareholder_limit: u64,
        shareholding_minimum: u128,
        non_divisible: bool,
    ) -> Result<ClassId, LedgerError> {
        self.with(|ledger| ledger.create_class(shareholder_limit, shareholding_minimum, non_divisible))
    }

    pub fn mint(&self, account: AccountAddress, class_id: ClassId, amount: u128) -> Result<(), LedgerError> {
        self.with(|ledger| ledger.mint(account, class_id, amount))
    }

    pub fn mint_batch(
        &self,
        accounts: &[AccountAddress],
        class_id: ClassId,
        amounts: &[u128],
        memo: &[u8],
    ) -> Result<BatchOutcome, LedgerError> {
        self.with(|ledger| ledger.mint_batch(accounts, class_id, amounts, memo))
    }

    pub fn transfer(
        &self,
        from: AccountAddress,
        to: AccountAddress,
        class_id: ClassId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.with(|ledger| ledger.transfer(from, to, class_id, amount))
    }

    pub fn transfer_batch(
        &self,
        from: AccountAddress,
        recipients: &[AccountAddress],
        class_id: ClassId,
        amounts: &[u128],
        memo: &[u8],
    ) -> Result<BatchOutcome, LedgerError> {
        self.with(|ledger| ledger.transfer_batch(from, recipients, class_id, amounts, memo))
    }

    pub fn burn(&self, account: AccountAddress, class_id: ClassId, amount: u128) -> Result<(), LedgerError> {
        self.with(|ledger| ledger.burn(account, class_id, amount))
    }

    pub fn balance_of(&self, account: &AccountAddress, class_id: ClassId) -> Result<u128, LedgerError> {
        self.with(|ledger| ledger.balance_of(account, class_id))
    }

    pub fn holder_count(&self, class_id: ClassId) -> Result<u64, LedgerError> {
        self.with(|ledger| ledger.holder_count(class_id))
    }

    pub fn policy_of(&self, class_id: ClassId) -> Result<CompliancePolicy, LedgerError> {
        self.with(|ledger| ledger.policy_of(class_id))
    }

    pub fn holders(&self, class_id: ClassId) -> Result<Vec<AccountAddress>, LedgerError> {
        self.with(|ledger| ledger.holders(class_id))
    }
}
