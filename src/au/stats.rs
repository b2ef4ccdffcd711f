//! Per-item aggregates and the canonical item order.
//!
//! An item receives its rank the first time it is seen and keeps it for the
//! lifetime of the index, so every tree path and every cached bound term is
//! computed under a single order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::error::InvalidTransaction;
use super::store::Transaction;
use super::{Item, Utility};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub total_utility: Utility,
    pub count: usize,
    /// Best utility of a single occurrence
    pub max_utility: Utility,
    pub rank: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    entries: HashMap<Item, ItemStats>,
    /// Items by rank
    order: Vec<Item>,
    total_utility: Utility,
    num_transactions: usize,
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject a transaction whose utility would overflow the running total.
    ///
    /// Every per-item and per-itemset sum is bounded by the total, so this is
    /// the only check needed before `record_transaction`.
    pub fn admit(&self, transaction: &Transaction) -> Result<(), InvalidTransaction> {
        self.total_utility
            .checked_add(transaction.utility())
            .map(|_| ())
            .ok_or(InvalidTransaction::UtilityOverflow)
    }

    /// Fold one accepted transaction into the table.
    ///
    /// Items seen for the first time are ranked after every known item,
    /// ordered among themselves by descending utility, then by item id.
    /// Returns the number of new items.
    pub fn record_transaction(&mut self, transaction: &Transaction) -> usize {
        let mut fresh: Vec<(Item, Utility)> = transaction
            .pairs()
            .iter()
            .filter(|(item, _)| !self.entries.contains_key(item))
            .copied()
            .collect();
        fresh.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for &(item, _) in &fresh {
            let rank = self.order.len();
            self.order.push(item);
            self.entries.insert(
                item,
                ItemStats {
                    total_utility: 0,
                    count: 0,
                    max_utility: 0,
                    rank,
                },
            );
        }

        for &(item, utility) in transaction.pairs() {
            if let Some(entry) = self.entries.get_mut(&item) {
                entry.total_utility += utility;
                entry.count += 1;
                entry.max_utility = entry.max_utility.max(utility);
            }
        }

        self.total_utility += transaction.utility();
        self.num_transactions += 1;
        fresh.len()
    }

    pub fn order_key(&self, item: Item) -> Option<usize> {
        self.entries.get(&item).map(|entry| entry.rank)
    }

    pub fn stats(&self, item: Item) -> Option<&ItemStats> {
        self.entries.get(&item)
    }

    pub fn snapshot(&self) -> OrderSnapshot<'_> {
        OrderSnapshot { table: self }
    }

    /// Items in canonical order
    pub fn items(&self) -> &[Item] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn total_utility(&self) -> Utility {
        self.total_utility
    }

    pub fn num_transactions(&self) -> usize {
        self.num_transactions
    }

    /// Rebuild a table from persisted parts.
    pub(crate) fn from_parts(
        order: Vec<Item>,
        stats: Vec<ItemStats>,
        total_utility: Utility,
        num_transactions: usize,
    ) -> Self {
        let entries = order.iter().copied().zip(stats).collect();
        Self {
            entries,
            order,
            total_utility,
            num_transactions,
        }
    }

    pub(crate) fn stats_in_order(&self) -> Vec<ItemStats> {
        self.order.iter().map(|item| self.entries[item]).collect()
    }
}

/// Borrowed view of the item order at one revision of the table.
#[derive(Debug, Clone, Copy)]
pub struct OrderSnapshot<'a> {
    table: &'a ItemTable,
}

impl<'a> OrderSnapshot<'a> {
    /// Number of ranked items; grows as new items arrive.
    pub fn revision(&self) -> usize {
        self.table.order.len()
    }

    pub fn rank(&self, item: Item) -> Option<usize> {
        self.table.order_key(item)
    }

    /// Unranked items sort after every ranked one.
    pub fn compare(&self, a: Item, b: Item) -> Ordering {
        let rank_a = self.rank(a).unwrap_or(usize::MAX);
        let rank_b = self.rank(b).unwrap_or(usize::MAX);
        rank_a.cmp(&rank_b).then(a.cmp(&b))
    }

    pub fn sort_pairs(&self, pairs: &mut [(Item, Utility)]) {
        pairs.sort_by(|a, b| self.compare(a.0, b.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(pairs: &[(Item, i64)]) -> Transaction {
        Transaction::new(pairs).unwrap()
    }

    #[test]
    fn ranks_new_items_by_utility_then_id() {
        let mut table = ItemTable::new();
        assert_eq!(table.record_transaction(&tx(&[(4, 1), (2, 5), (9, 5)])), 3);

        assert_eq!(table.order_key(2), Some(0));
        assert_eq!(table.order_key(9), Some(1));
        assert_eq!(table.order_key(4), Some(2));
        assert_eq!(table.order_key(7), None);
    }

    #[test]
    fn ranks_are_frozen_once_assigned() {
        let mut table = ItemTable::new();
        table.record_transaction(&tx(&[(1, 1)]));
        table.record_transaction(&tx(&[(1, 1), (2, 100)]));

        assert_eq!(table.order_key(1), Some(0));
        assert_eq!(table.order_key(2), Some(1));
        assert_eq!(table.snapshot().revision(), 2);
    }

    #[test]
    fn accumulates_item_statistics() {
        let mut table = ItemTable::new();
        table.record_transaction(&tx(&[(1, 3), (2, 1)]));
        table.record_transaction(&tx(&[(1, 1), (2, 3)]));

        let a = table.stats(1).unwrap();
        assert_eq!(a.total_utility, 4);
        assert_eq!(a.count, 2);
        assert_eq!(a.max_utility, 3);
        assert_eq!(table.total_utility(), 8);
        assert_eq!(table.num_transactions(), 2);
    }

    #[test]
    fn snapshot_sorts_by_rank() {
        let mut table = ItemTable::new();
        table.record_transaction(&tx(&[(5, 10), (3, 1)]));
        let order = table.snapshot();

        let mut pairs = vec![(3, 1), (8, 2), (5, 10)];
        order.sort_pairs(&mut pairs);
        assert_eq!(pairs, vec![(5, 10), (3, 1), (8, 2)]);
    }
}
