//! All-or-nothing validation of multi-entry operations.
//!
//! Every mutating ledger operation is expressed as a [`PendingBatch`]. The
//! [`BatchCoordinator`] dry-runs the batch against scratch copies of the
//! touched balances and holder counts, running the compliance engine on each
//! entry in input order. Only a fully validated batch yields a [`BatchPlan`];
//! the ledger then commits the plan in one step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::balances::BalanceTable;
use crate::error::LedgerError;
use crate::registry::TokenClassRegistry;
use hypershare_compliance::{BalanceDelta, ComplianceEngine, HolderDelta};
use hypershare_types::{AccountAddress, ClassId};

/// What produced a pending entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Mint,
    Burn,
    TransferDebit,
    TransferCredit,
}

/// One proposed balance change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    /// Position of the originating item in the caller's input, reported on rejection.
    pub position: usize,
    pub account: AccountAddress,
    pub class_id: ClassId,
    pub delta: BalanceDelta,
    pub kind: EntryKind,
}

impl PendingEntry {
    pub fn mint(position: usize, account: AccountAddress, class_id: ClassId, amount: u128) -> Self {
        Self {
            position,
            account,
            class_id,
            delta: BalanceDelta::Credit(amount),
            kind: EntryKind::Mint,
        }
    }

    pub fn burn(position: usize, account: AccountAddress, class_id: ClassId, amount: u128) -> Self {
        Self {
            position,
            account,
            class_id,
            delta: BalanceDelta::Debit(amount),
            kind: EntryKind::Burn,
        }
    }

    /// The debit and credit halves of a transfer, debit first.
    pub fn transfer(
        position: usize,
        from: AccountAddress,
        to: AccountAddress,
        class_id: ClassId,
        amount: u128,
    ) -> [Self; 2] {
        [
            Self {
                position,
                account: from,
                class_id,
                delta: BalanceDelta::Debit(amount),
                kind: EntryKind::TransferDebit,
            },
            Self {
                position,
                account: to,
                class_id,
                delta: BalanceDelta::Credit(amount),
                kind: EntryKind::TransferCredit,
            },
        ]
    }
}

/// Ordered entries awaiting validation. Discarded after commit or abort.
#[derive(Clone, Debug, Default)]
pub struct PendingBatch {
    entries: Vec<PendingEntry>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: PendingEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = PendingEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct classes touched, in order of first appearance.
    pub fn class_ids(&self) -> Vec<ClassId> {
        let mut ids = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&entry.class_id) {
                ids.push(entry.class_id);
            }
        }
        ids
    }
}

/// The validated end state of one class after a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassPlan {
    pub class_id: ClassId,
    /// Holder count after the batch.
    pub holder_count: u64,
    /// Final balance of every account the batch touched.
    pub balances: Vec<(AccountAddress, u128)>,
    /// Accounts that were not holders before the batch and are after it.
    pub joined: Vec<AccountAddress>,
    /// Accounts that were holders before the batch and are not after it.
    pub left: Vec<AccountAddress>,
}

/// A fully validated batch, ready to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    pub classes: Vec<ClassPlan>,
    pub entries: usize,
}

/// Summary of a committed batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOutcome {
    pub entries: usize,
    pub classes: Vec<ClassOutcome>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassOutcome {
    pub class_id: ClassId,
    pub holder_count: u64,
    pub joined: Vec<AccountAddress>,
    pub left: Vec<AccountAddress>,
}

impl ClassOutcome {
    /// Net change in holder count caused by the batch.
    pub fn holder_delta(&self) -> i64 {
        self.joined.len() as i64 - self.left.len() as i64
    }
}

impl From<BatchPlan> for BatchOutcome {
    fn from(plan: BatchPlan) -> Self {
        Self {
            entries: plan.entries,
            classes: plan
                .classes
                .into_iter()
                .map(|c| ClassOutcome {
                    class_id: c.class_id,
                    holder_count: c.holder_count,
                    joined: c.joined,
                    left: c.left,
                })
                .collect(),
        }
    }
}

/// Dry-runs batches against read-only ledger state.
pub struct BatchCoordinator<'a> {
    engine: &'a ComplianceEngine,
    registry: &'a TokenClassRegistry,
    balances: &'a BalanceTable,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(
        engine: &'a ComplianceEngine,
        registry: &'a TokenClassRegistry,
        balances: &'a BalanceTable,
    ) -> Self {
        Self {
            engine,
            registry,
            balances,
        }
    }

    /// Validate every entry of `batch` and compute the resulting state.
    ///
    /// Entries are grouped by class (groups ordered by first appearance) and
    /// simulated in input order within each group. The first failing entry
    /// aborts the whole batch.
    pub fn simulate(&self, batch: &PendingBatch) -> Result<BatchPlan, LedgerError> {
        if batch.is_empty() {
            return Err(LedgerError::ArityMismatch {
                accounts: 0,
                amounts: 0,
            });
        }

        let mut groups: Vec<(ClassId, Vec<&PendingEntry>)> = Vec::new();
        for entry in batch.entries() {
            match groups.iter_mut().find(|(id, _)| *id == entry.class_id) {
                Some((_, entries)) => entries.push(entry),
                None => groups.push((entry.class_id, vec![entry])),
            }
        }

        let classes = groups
            .into_iter()
            .map(|(class_id, entries)| self.simulate_class(class_id, &entries))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BatchPlan {
            classes,
            entries: batch.len(),
        })
    }

    fn simulate_class(
        &self,
        class_id: ClassId,
        entries: &[&PendingEntry],
    ) -> Result<ClassPlan, LedgerError> {
        let policy = self.registry.policy(class_id)?;
        let mut holder_count = self.registry.holder_count(class_id)?;
        // account -> (balance before the batch, scratch balance)
        let mut scratch: BTreeMap<AccountAddress, (u128, u128)> = BTreeMap::new();

        for entry in entries {
            if entry.account.is_zero() {
                return Err(LedgerError::InvalidParameters(format!(
                    "entry {} targets the zero address",
                    entry.position
                )));
            }
            if entry.delta.amount() == 0 {
                return Err(LedgerError::InvalidParameters(format!(
                    "entry {} has a zero amount",
                    entry.position
                )));
            }

            let (initial, current) = *scratch.entry(entry.account).or_insert_with(|| {
                let balance = self.balances.get(class_id, &entry.account);
                (balance, balance)
            });

            if entry.delta.is_debit() && current < entry.delta.amount() {
                return Err(LedgerError::InsufficientBalance {
                    position: entry.position,
                    account: entry.account,
                    class_id,
                    needed: entry.delta.amount(),
                    available: current,
                });
            }

            let decision = self
                .engine
                .validate(&policy, current, entry.delta, holder_count)
                .map_err(|source| LedgerError::Compliance {
                    position: entry.position,
                    account: entry.account,
                    class_id,
                    source,
                })?;

            holder_count = match decision.holder_delta {
                HolderDelta::Joined => holder_count.saturating_add(1),
                HolderDelta::Left => holder_count.saturating_sub(1),
                HolderDelta::Unchanged => holder_count,
            };

            tracing::debug!(
                class = %class_id,
                account = %entry.account,
                kind = ?entry.kind,
                balance = decision.new_balance,
                holders = holder_count,
                "batch entry validated"
            );

            scratch.insert(entry.account, (initial, decision.new_balance));
        }

        let mut plan = ClassPlan {
            class_id,
            holder_count,
            balances: Vec::with_capacity(scratch.len()),
            joined: Vec::new(),
            left: Vec::new(),
        };
        for (account, (initial, last)) in scratch {
            if initial == 0 && last > 0 {
                plan.joined.push(account);
            } else if initial > 0 && last == 0 {
                plan.left.push(account);
            }
            plan.balances.push((account, last));
        }
        Ok(plan)
    }
}
