//! The share ledger: balances per (account, class), gated by compliance.
//!
//! Every mutating operation follows the same two phases:
//! 1. build a [`PendingBatch`] and dry-run it through the [`BatchCoordinator`];
//! 2. if every entry validated, commit the resulting [`BatchPlan`] in one step.
//!
//! A failure in phase 1 returns before anything is written, so rejected
//! operations leave balances and holder counts untouched.

use std::path::Path;

use crate::balances::BalanceTable;
use crate::batch::{BatchCoordinator, BatchOutcome, BatchPlan, PendingBatch, PendingEntry};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::event::{EventBus, LedgerEvent, Operation};
use crate::registry::TokenClassRegistry;
use crate::snapshot::{BalanceRecord, LedgerSnapshot, SNAPSHOT_VERSION};
use hypershare_compliance::ComplianceEngine;
use hypershare_types::{AccountAddress, ClassId, CompliancePolicy};

/// A multi-class share ledger.
#[derive(Debug)]
pub struct Ledger {
    registry: TokenClassRegistry,
    balances: BalanceTable,
    engine: ComplianceEngine,
    config: LedgerConfig,
    events: EventBus,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let unit = config.share_unit()?;
        Ok(Self {
            registry: TokenClassRegistry::new(unit),
            balances: BalanceTable::new(),
            engine: ComplianceEngine::new(unit),
            config,
            events: EventBus::new(),
        })
    }

    /// Load the snapshot at `config.snapshot_path` if it exists, otherwise start empty.
    pub fn open(config: LedgerConfig) -> Result<Self, LedgerError> {
        match config.snapshot_path.clone() {
            Some(path) if path.exists() => {
                let snapshot = LedgerSnapshot::load_from_file(&path)?;
                tracing::info!(path = %path.display(), "loading ledger snapshot");
                Self::from_snapshot(snapshot, config)
            }
            _ => Self::new(config),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn registry(&self) -> &TokenClassRegistry {
        &self.registry
    }

    /// Register an event listener. Events are emitted only after a commit
    /// (or, for rejections, after the operation has been abandoned).
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Class management ────────────────────────────────────────────────

    /// Create a new share class with the given compliance policy.
    pub fn create_class(
        &mut self,
        shareholder_limit: u64,
        shareholding_minimum: u128,
        non_divisible: bool,
    ) -> Result<ClassId, LedgerError> {
        let class_id = self
            .registry
            .create_class(shareholder_limit, shareholding_minimum, non_divisible)
            .map_err(|e| self.reject(Operation::CreateClass, e))?;
        let policy = self.registry.policy(class_id)?;
        tracing::info!(class = %class_id, %policy, "share class created");
        self.events.emit(&LedgerEvent::ClassCreated { class_id, policy });
        Ok(class_id)
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Issue `amount` new shares of `class_id` to `account`.
    pub fn mint(
        &mut self,
        account: AccountAddress,
        class_id: ClassId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let mut batch = PendingBatch::with_capacity(1);
        batch.push(PendingEntry::mint(0, account, class_id, amount));
        let outcome = self.execute(Operation::Mint, &batch)?;
        self.events.emit(&LedgerEvent::Minted {
            class_id,
            account,
            amount,
        });
        self.emit_holder_changes(&outcome);
        Ok(())
    }

    /// Issue shares of one class to several accounts, all or nothing.
    pub fn mint_batch(
        &mut self,
        accounts: &[AccountAddress],
        class_id: ClassId,
        amounts: &[u128],
        memo: &[u8],
    ) -> Result<BatchOutcome, LedgerError> {
        self.check_arity(Operation::MintBatch, accounts.len(), amounts.len())?;
        self.check_batch_size(Operation::MintBatch, accounts.len())?;
        let mut batch = PendingBatch::with_capacity(accounts.len());
        for (position, (account, amount)) in accounts.iter().zip(amounts).enumerate() {
            batch.push(PendingEntry::mint(position, *account, class_id, *amount));
        }
        let outcome = self.execute(Operation::MintBatch, &batch)?;
        for (account, amount) in accounts.iter().zip(amounts) {
            self.events.emit(&LedgerEvent::Minted {
                class_id,
                account: *account,
                amount: *amount,
            });
        }
        self.emit_holder_changes(&outcome);
        self.emit_batch_committed(Operation::MintBatch, &batch, memo);
        Ok(outcome)
    }

    /// Move `amount` shares of `class_id` from `from` to `to`.
    ///
    /// Self-transfers are rejected with [`LedgerError::SelfTransferNotAllowed`].
    pub fn transfer(
        &mut self,
        from: AccountAddress,
        to: AccountAddress,
        class_id: ClassId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if from == to {
            return Err(self.reject(Operation::Transfer, LedgerError::SelfTransferNotAllowed(from)));
        }
        let mut batch = PendingBatch::with_capacity(2);
        batch.extend(PendingEntry::transfer(0, from, to, class_id, amount));
        let outcome = self.execute(Operation::Transfer, &batch)?;
        self.events.emit(&LedgerEvent::Transferred {
            class_id,
            from,
            to,
            amount,
        });
        self.emit_holder_changes(&outcome);
        Ok(())
    }

    /// Move shares of one class from `from` to several recipients, all or nothing.
    pub fn transfer_batch(
        &mut self,
        from: AccountAddress,
        recipients: &[AccountAddress],
        class_id: ClassId,
        amounts: &[u128],
        memo: &[u8],
    ) -> Result<BatchOutcome, LedgerError> {
        self.check_arity(Operation::TransferBatch, recipients.len(), amounts.len())?;
        self.check_batch_size(Operation::TransferBatch, recipients.len())?;
        if recipients.contains(&from) {
            return Err(self.reject(
                Operation::TransferBatch,
                LedgerError::SelfTransferNotAllowed(from),
            ));
        }
        let mut batch = PendingBatch::with_capacity(recipients.len() * 2);
        for (position, (to, amount)) in recipients.iter().zip(amounts).enumerate() {
            batch.extend(PendingEntry::transfer(position, from, *to, class_id, *amount));
        }
        let outcome = self.execute(Operation::TransferBatch, &batch)?;
        for (to, amount) in recipients.iter().zip(amounts) {
            self.events.emit(&LedgerEvent::Transferred {
                class_id,
                from,
                to: *to,
                amount: *amount,
            });
        }
        self.emit_holder_changes(&outcome);
        self.emit_batch_committed(Operation::TransferBatch, &batch, memo);
        Ok(outcome)
    }

    /// Destroy `amount` shares of `class_id` held by `account`.
    pub fn burn(
        &mut self,
        account: AccountAddress,
        class_id: ClassId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let mut batch = PendingBatch::with_capacity(1);
        batch.push(PendingEntry::burn(0, account, class_id, amount));
        let outcome = self.execute(Operation::Burn, &batch)?;
        self.events.emit(&LedgerEvent::Burned {
            class_id,
            account,
            amount,
        });
        self.emit_holder_changes(&outcome);
        Ok(())
    }

    /// Destroy shares of one class held by several accounts, all or nothing.
    pub fn burn_batch(
        &mut self,
        accounts: &[AccountAddress],
        class_id: ClassId,
        amounts: &[u128],
        memo: &[u8],
    ) -> Result<BatchOutcome, LedgerError> {
        self.check_arity(Operation::BurnBatch, accounts.len(), amounts.len())?;
        self.check_batch_size(Operation::BurnBatch, accounts.len())?;
        let mut batch = PendingBatch::with_capacity(accounts.len());
        for (position, (account, amount)) in accounts.iter().zip(amounts).enumerate() {
            batch.push(PendingEntry::burn(position, *account, class_id, *amount));
        }
        let outcome = self.execute(Operation::BurnBatch, &batch)?;
        for (account, amount) in accounts.iter().zip(amounts) {
            self.events.emit(&LedgerEvent::Burned {
                class_id,
                account: *account,
                amount: *amount,
            });
        }
        self.emit_holder_changes(&outcome);
        self.emit_batch_committed(Operation::BurnBatch, &batch, memo);
        Ok(outcome)
    }

    /// Apply an arbitrary, possibly multi-class batch as one atomic unit.
    ///
    /// `max_batch_entries` counts the entries as pushed, so a transfer pair
    /// counts twice here.
    pub fn apply_batch(&mut self, batch: PendingBatch, memo: &[u8]) -> Result<BatchOutcome, LedgerError> {
        self.check_batch_size(Operation::ApplyBatch, batch.len())?;
        let outcome = self.execute(Operation::ApplyBatch, &batch)?;
        self.emit_holder_changes(&outcome);
        self.emit_batch_committed(Operation::ApplyBatch, &batch, memo);
        Ok(outcome)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn balance_of(&self, account: &AccountAddress, class_id: ClassId) -> Result<u128, LedgerError> {
        self.ensure_class(class_id)?;
        Ok(self.balances.get(class_id, account))
    }

    /// Balances for pairs of `accounts[i]` and `class_ids[i]`.
    pub fn balance_of_batch(
        &self,
        accounts: &[AccountAddress],
        class_ids: &[ClassId],
    ) -> Result<Vec<u128>, LedgerError> {
        if accounts.len() != class_ids.len() {
            return Err(LedgerError::ArityMismatch {
                accounts: accounts.len(),
                amounts: class_ids.len(),
            });
        }
        accounts
            .iter()
            .zip(class_ids)
            .map(|(account, class_id)| self.balance_of(account, *class_id))
            .collect()
    }

    pub fn holder_count(&self, class_id: ClassId) -> Result<u64, LedgerError> {
        self.registry.holder_count(class_id)
    }

    pub fn policy_of(&self, class_id: ClassId) -> Result<CompliancePolicy, LedgerError> {
        self.registry.policy(class_id)
    }

    /// Current holders of a class, ordered by address.
    pub fn holders(&self, class_id: ClassId) -> Result<Vec<AccountAddress>, LedgerError> {
        self.ensure_class(class_id)?;
        Ok(self.balances.holders(class_id).map(|(a, _)| *a).collect())
    }

    pub fn total_supply(&self, class_id: ClassId) -> Result<u128, LedgerError> {
        self.ensure_class(class_id)?;
        Ok(self.balances.total_supply(class_id))
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Capture the full ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let balances = self
            .balances
            .sorted_entries()
            .into_iter()
            .map(|(class_id, account, amount)| BalanceRecord {
                class_id,
                account,
                amount,
            })
            .collect();
        LedgerSnapshot::create(
            self.config.share_decimals,
            self.registry.records().to_vec(),
            balances,
        )
    }

    /// Write a snapshot to `config.snapshot_path`.
    pub fn save_snapshot(&self) -> Result<(), LedgerError> {
        let path = self
            .config
            .snapshot_path
            .as_deref()
            .ok_or_else(|| LedgerError::Config("snapshot_path is not set".into()))?;
        self.save_snapshot_to(path)
    }

    pub fn save_snapshot_to(&self, path: &Path) -> Result<(), LedgerError> {
        let snapshot = self.snapshot();
        snapshot.save_to_file(path)?;
        tracing::info!(
            path = %path.display(),
            classes = snapshot.classes.len(),
            balances = snapshot.balances.len(),
            "ledger snapshot saved"
        );
        Ok(())
    }

    /// Rebuild a ledger from a snapshot, re-checking every cap-table invariant.
    pub fn from_snapshot(snapshot: LedgerSnapshot, config: LedgerConfig) -> Result<Self, LedgerError> {
        if !snapshot.verify() {
            tracing::warn!("snapshot hash mismatch");
            return Err(LedgerError::CorruptSnapshot("hash mismatch".into()));
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(LedgerError::CorruptSnapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }
        if snapshot.share_decimals != config.share_decimals {
            return Err(LedgerError::Config(format!(
                "snapshot uses {} share decimals, config has {}",
                snapshot.share_decimals, config.share_decimals
            )));
        }

        let mut ledger = Self::new(config)?;
        let unit = ledger.engine.unit();
        ledger.registry = TokenClassRegistry::from_records(snapshot.classes, unit)?;

        let mut previous: Option<(ClassId, AccountAddress)> = None;
        for record in snapshot.balances {
            let key = (record.class_id, record.account);
            if previous.is_some_and(|p| p >= key) {
                return Err(LedgerError::CorruptSnapshot(
                    "balances are not strictly ordered".into(),
                ));
            }
            previous = Some(key);

            let policy = ledger
                .registry
                .policy(record.class_id)
                .map_err(|_| LedgerError::CorruptSnapshot(format!("balance for unknown class {}", record.class_id)))?;
            if record.amount == 0 || record.account.is_zero() {
                return Err(LedgerError::CorruptSnapshot("empty balance record".into()));
            }
            if !policy.admits_balance(record.amount) {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "balance {} below minimum in class {}",
                    record.amount, record.class_id
                )));
            }
            if policy.non_divisible && !unit.is_whole(record.amount) {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "fractional balance {} in non-divisible class {}",
                    record.amount, record.class_id
                )));
            }
            ledger.balances.set(record.class_id, record.account, record.amount);
        }

        for class in ledger.registry.records() {
            let holders = ledger.balances.holder_len(class.class_id) as u64;
            if holders != class.holder_count {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "class {} records {} holders but has {}",
                    class.class_id, class.holder_count, holders
                )));
            }
            if !class.policy.admits_holder_count(holders) {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "class {} exceeds its shareholder limit",
                    class.class_id
                )));
            }
        }

        Ok(ledger)
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn ensure_class(&self, class_id: ClassId) -> Result<(), LedgerError> {
        if self.registry.contains(class_id) {
            Ok(())
        } else {
            Err(LedgerError::UnknownClass(class_id))
        }
    }

    fn check_arity(&self, operation: Operation, accounts: usize, amounts: usize) -> Result<(), LedgerError> {
        if accounts == 0 || accounts != amounts {
            return Err(self.reject(operation, LedgerError::ArityMismatch { accounts, amounts }));
        }
        Ok(())
    }

    /// Batch calls only. `items` is the number of entries the caller passed.
    fn check_batch_size(&self, operation: Operation, items: usize) -> Result<(), LedgerError> {
        let max = self.config.max_batch_entries;
        if max > 0 && items > max {
            return Err(self.reject(operation, LedgerError::BatchTooLarge { entries: items, max }));
        }
        Ok(())
    }

    /// Validate `batch` and, if every entry passes, commit it.
    fn execute(&mut self, operation: Operation, batch: &PendingBatch) -> Result<BatchOutcome, LedgerError> {
        let plan = BatchCoordinator::new(&self.engine, &self.registry, &self.balances)
            .simulate(batch)
            .map_err(|e| self.reject(operation, e))?;

        let outcome = self.commit(plan);
        tracing::info!(
            %operation,
            entries = outcome.entries,
            classes = outcome.classes.len(),
            "operation committed"
        );
        Ok(outcome)
    }

    /// Write a validated plan. Infallible: every check happened during simulation.
    fn commit(&mut self, plan: BatchPlan) -> BatchOutcome {
        for class in &plan.classes {
            for (account, amount) in &class.balances {
                self.balances.set(class.class_id, *account, *amount);
            }
            self.registry.set_holder_count(class.class_id, class.holder_count);
        }
        BatchOutcome::from(plan)
    }

    fn emit_holder_changes(&self, outcome: &BatchOutcome) {
        for class in &outcome.classes {
            for account in &class.joined {
                self.events.emit(&LedgerEvent::HolderJoined {
                    class_id: class.class_id,
                    account: *account,
                });
            }
            for account in &class.left {
                self.events.emit(&LedgerEvent::HolderLeft {
                    class_id: class.class_id,
                    account: *account,
                });
            }
        }
    }

    fn reject(&self, operation: Operation, error: LedgerError) -> LedgerError {
        tracing::warn!(%operation, %error, "operation rejected");
        self.events.emit(&LedgerEvent::OperationRejected {
            operation,
            reason: error.to_string(),
        });
        error
    }

    fn emit_batch_committed(&self, operation: Operation, batch: &PendingBatch, memo: &[u8]) {
        self.events.emit(&LedgerEvent::BatchCommitted {
            operation,
            class_ids: batch.class_ids(),
            entries: batch.len(),
            memo: memo.to_vec(),
        });
    }
}

impl Default for Ledger {
    fn default() -> Self {
        let config = LedgerConfig::default();
        let unit = hypershare_types::ShareUnit::RAW;
        Self {
            registry: TokenClassRegistry::new(unit),
            balances: BalanceTable::new(),
            engine: ComplianceEngine::new(unit),
            config,
            events: EventBus::new(),
        }
    }
}
