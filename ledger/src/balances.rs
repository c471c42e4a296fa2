//! Per-(class, account) balance table.

use std::collections::{BTreeMap, HashMap};

use hypershare_types::{AccountAddress, ClassId};

/// Balances keyed by class, then account.
///
/// Only non-zero balances are stored, so the keys of a class's map are exactly
/// its holder set.
#[derive(Clone, Debug, Default)]
pub struct BalanceTable {
    classes: HashMap<ClassId, BTreeMap<AccountAddress, u128>>,
}

impl BalanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class_id: ClassId, account: &AccountAddress) -> u128 {
        self.classes
            .get(&class_id)
            .and_then(|holders| holders.get(account))
            .copied()
            .unwrap_or(0)
    }

    /// Store a balance. Zero removes the account from the holder set.
    pub fn set(&mut self, class_id: ClassId, account: AccountAddress, amount: u128) {
        if amount == 0 {
            if let Some(holders) = self.classes.get_mut(&class_id) {
                holders.remove(&account);
                if holders.is_empty() {
                    self.classes.remove(&class_id);
                }
            }
        } else {
            self.classes
                .entry(class_id)
                .or_default()
                .insert(account, amount);
        }
    }

    /// Holders of a class with their balances, ordered by address.
    pub fn holders(&self, class_id: ClassId) -> impl Iterator<Item = (&AccountAddress, &u128)> {
        self.classes.get(&class_id).into_iter().flatten()
    }

    pub fn holder_len(&self, class_id: ClassId) -> usize {
        self.classes.get(&class_id).map_or(0, BTreeMap::len)
    }

    /// Sum of all balances in a class, saturating at `u128::MAX`.
    pub fn total_supply(&self, class_id: ClassId) -> u128 {
        self.holders(class_id)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Every stored balance ordered by (class, account).
    pub fn sorted_entries(&self) -> Vec<(ClassId, AccountAddress, u128)> {
        let mut class_ids: Vec<&ClassId> = self.classes.keys().collect();
        class_ids.sort();
        class_ids
            .into_iter()
            .flat_map(|class_id| {
                self.classes[class_id]
                    .iter()
                    .map(move |(account, amount)| (*class_id, *account, *amount))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> AccountAddress {
        AccountAddress::new([n; 20])
    }

    #[test]
    fn missing_balance_is_zero() {
        let table = BalanceTable::new();
        assert_eq!(table.get(ClassId::new(0), &addr(1)), 0);
    }

    #[test]
    fn setting_zero_removes_holder() {
        let mut table = BalanceTable::new();
        let class = ClassId::new(0);
        table.set(class, addr(1), 10);
        table.set(class, addr(2), 20);
        assert_eq!(table.holder_len(class), 2);

        table.set(class, addr(1), 0);
        assert_eq!(table.holder_len(class), 1);
        assert_eq!(table.get(class, &addr(1)), 0);
        assert_eq!(table.total_supply(class), 20);
    }

    #[test]
    fn holders_are_ordered_by_address() {
        let mut table = BalanceTable::new();
        let class = ClassId::new(0);
        table.set(class, addr(3), 1);
        table.set(class, addr(1), 1);
        table.set(class, addr(2), 1);
        let order: Vec<AccountAddress> = table.holders(class).map(|(a, _)| *a).collect();
        assert_eq!(order, vec![addr(1), addr(2), addr(3)]);
    }

    #[test]
    fn sorted_entries_order_by_class_then_account() {
        let mut table = BalanceTable::new();
        table.set(ClassId::new(1), addr(1), 5);
        table.set(ClassId::new(0), addr(2), 6);
        table.set(ClassId::new(0), addr(1), 7);
        assert_eq!(
            table.sorted_entries(),
            vec![
                (ClassId::new(0), addr(1), 7),
                (ClassId::new(0), addr(2), 6),
                (ClassId::new(1), addr(1), 5),
            ]
        );
    }
}
