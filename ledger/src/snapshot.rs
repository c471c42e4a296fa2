//! Capture every class and balance at a point in time.
//!
//! A snapshot is the ledger's persisted form. The hash is computed
//! deterministically over the class table and balances, so a loaded snapshot
//! can be checked for tampering or truncation before it is trusted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::registry::ClassRecord;
use hypershare_types::{AccountAddress, ClassId};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A ledger snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 of the snapshot content.
    pub hash: [u8; 32],
    /// Format version, see [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// Share decimals of the ledger that produced the snapshot.
    pub share_decimals: u32,
    /// Every class, ordered by id.
    pub classes: Vec<ClassRecord>,
    /// Every non-zero balance, ordered by (class, account).
    pub balances: Vec<BalanceRecord>,
}

/// One non-zero balance captured in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub class_id: ClassId,
    pub account: AccountAddress,
    pub amount: u128,
}

impl LedgerSnapshot {
    /// Build a snapshot and seal it with its hash.
    pub fn create(share_decimals: u32, classes: Vec<ClassRecord>, balances: Vec<BalanceRecord>) -> Self {
        let snap = Self {
            hash: [0u8; 32],
            version: SNAPSHOT_VERSION,
            share_decimals,
            classes,
            balances,
        };
        let hash = snap.compute_hash();
        Self { hash, ..snap }
    }

    /// Blake2b-256 over every field except `hash`, in a fixed byte order.
    fn compute_hash(&self) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.share_decimals.to_le_bytes());
        hasher.update((self.classes.len() as u64).to_le_bytes());
        for class in &self.classes {
            hasher.update(class.class_id.as_u64().to_le_bytes());
            hasher.update(class.policy.shareholder_limit.to_le_bytes());
            hasher.update(class.policy.shareholding_minimum.to_le_bytes());
            hasher.update([class.policy.non_divisible as u8]);
            hasher.update(class.holder_count.to_le_bytes());
        }
        hasher.update((self.balances.len() as u64).to_le_bytes());
        for balance in &self.balances {
            hasher.update(balance.class_id.as_u64().to_le_bytes());
            hasher.update(balance.account.as_bytes());
            hasher.update(balance.amount.to_le_bytes());
        }

        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }

    /// Verify the snapshot hash matches its content.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Serialize the snapshot to bytes (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Deserialize a snapshot from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), LedgerError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| LedgerError::Io(e.to_string()))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, LedgerError> {
        let bytes = std::fs::read(path).map_err(|e| LedgerError::Io(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypershare_types::CompliancePolicy;

    fn sample() -> LedgerSnapshot {
        let classes = vec![ClassRecord {
            class_id: ClassId::new(0),
            policy: CompliancePolicy::new(10, 5, true),
            holder_count: 1,
        }];
        let balances = vec![BalanceRecord {
            class_id: ClassId::new(0),
            account: AccountAddress::new([7; 20]),
            amount: 50,
        }];
        LedgerSnapshot::create(0, classes, balances)
    }

    #[test]
    fn test_create_and_verify() {
        let snap = sample();
        assert!(snap.verify());
        assert_eq!(snap.version, SNAPSHOT_VERSION);
        assert_eq!(snap.class_count(), 1);
    }

    #[test]
    fn test_tampered_snapshot_fails_verify() {
        let mut snap = sample();
        snap.balances[0].amount = 51;
        assert!(!snap.verify());
    }

    #[test]
    fn test_tampered_policy_fails_verify() {
        let mut snap = sample();
        snap.classes[0].policy.shareholder_limit = 11;
        assert!(!snap.verify());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let snap = sample();
        let bytes = snap.to_bytes().unwrap();
        let restored = LedgerSnapshot::from_bytes(&bytes).expect("deserialization failed");
        assert_eq!(restored, snap);
        assert!(restored.verify());
    }

    #[test]
    fn test_truncated_bytes_fail() {
        let bytes = sample().to_bytes().unwrap();
        let err = LedgerSnapshot::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = LedgerSnapshot::create(0, vec![], vec![]);
        assert!(snap.verify());
        assert_eq!(snap.class_count(), 0);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.snapshot");
        let snap = sample();
        snap.save_to_file(&path).unwrap();
        assert_eq!(LedgerSnapshot::load_from_file(&path).unwrap(), snap);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LedgerSnapshot::load_from_file(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
    }
}
