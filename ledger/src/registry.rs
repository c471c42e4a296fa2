//! Per-class compliance policy and holder counts.
//!
//! Policies are immutable once stored. Holder counts are written only by the
//! ledger's commit phase; external callers can read them but never set them.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use hypershare_types::{ClassId, CompliancePolicy, ShareUnit};

/// One registered share class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub class_id: ClassId,
    pub policy: CompliancePolicy,
    pub holder_count: u64,
}

/// Owned table of every share class the ledger knows about.
///
/// Class ids are sequential from 0, so the record for id `n` lives at index `n`.
#[derive(Clone, Debug)]
pub struct TokenClassRegistry {
    classes: Vec<ClassRecord>,
    unit: ShareUnit,
}

impl TokenClassRegistry {
    pub fn new(unit: ShareUnit) -> Self {
        Self {
            classes: Vec::new(),
            unit,
        }
    }

    /// Rebuild a registry from previously captured records.
    ///
    /// Records must carry the ids 0..n in order.
    pub fn from_records(records: Vec<ClassRecord>, unit: ShareUnit) -> Result<Self, LedgerError> {
        for (expected, record) in records.iter().enumerate() {
            if record.class_id.as_u64() != expected as u64 {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "class ids are not sequential: expected {expected}, found {}",
                    record.class_id
                )));
            }
            Self::check_policy(&record.policy, unit)?;
        }
        Ok(Self {
            classes: records,
            unit,
        })
    }

    /// Register a new class and return its id.
    pub fn create_class(
        &mut self,
        shareholder_limit: u64,
        shareholding_minimum: u128,
        non_divisible: bool,
    ) -> Result<ClassId, LedgerError> {
        let policy = CompliancePolicy::new(shareholder_limit, shareholding_minimum, non_divisible);
        Self::check_policy(&policy, self.unit)?;

        let class_id = match self.classes.last() {
            Some(last) => last.class_id.next().ok_or_else(|| {
                LedgerError::InvalidParameters("class id space exhausted".into())
            })?,
            None => ClassId::new(0),
        };
        self.classes.push(ClassRecord {
            class_id,
            policy,
            holder_count: 0,
        });
        Ok(class_id)
    }

    fn check_policy(policy: &CompliancePolicy, unit: ShareUnit) -> Result<(), LedgerError> {
        if policy.non_divisible && !unit.is_whole(policy.shareholding_minimum) {
            return Err(LedgerError::InvalidParameters(format!(
                "minimum {} is not a whole multiple of the share unit {}",
                policy.shareholding_minimum,
                unit.raw()
            )));
        }
        Ok(())
    }

    fn record(&self, class_id: ClassId) -> Result<&ClassRecord, LedgerError> {
        usize::try_from(class_id.as_u64())
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .ok_or(LedgerError::UnknownClass(class_id))
    }

    pub fn policy(&self, class_id: ClassId) -> Result<CompliancePolicy, LedgerError> {
        self.record(class_id).map(|r| r.policy)
    }

    pub fn holder_count(&self, class_id: ClassId) -> Result<u64, LedgerError> {
        self.record(class_id).map(|r| r.holder_count)
    }

    pub fn contains(&self, class_id: ClassId) -> bool {
        self.record(class_id).is_ok()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn records(&self) -> &[ClassRecord] {
        &self.classes
    }

    pub fn unit(&self) -> ShareUnit {
        self.unit
    }

    /// Overwrite a class's holder count. Commit phase only; the class must exist.
    pub(crate) fn set_holder_count(&mut self, class_id: ClassId, count: u64) {
        let slot = usize::try_from(class_id.as_u64())
            .ok()
            .and_then(|idx| self.classes.get_mut(idx));
        debug_assert!(slot.is_some(), "holder count committed for unknown class");
        if let Some(record) = slot {
            record.holder_count = count;
        }
    }
}
