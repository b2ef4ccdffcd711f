//! Append-only transaction storage.
//!
//! Transactions are kept once and addressed by position; postings lists in
//! the tree refer to them by `TransactionId`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::InvalidTransaction;
use super::stats::OrderSnapshot;
use super::{Item, TransactionId, Utility};

/// A validated transaction in arrival form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pairs: Vec<(Item, Utility)>,
    utility: Utility,
}

impl Transaction {
    pub fn new(pairs: &[(Item, i64)]) -> Result<Self, InvalidTransaction> {
        if pairs.is_empty() {
            return Err(InvalidTransaction::Empty);
        }

        let mut seen = HashSet::with_capacity(pairs.len());
        let mut validated = Vec::with_capacity(pairs.len());
        for &(item, utility) in pairs {
            if !seen.insert(item) {
                return Err(InvalidTransaction::DuplicateItem(item));
            }
            if utility <= 0 {
                return Err(InvalidTransaction::NonPositiveUtility { item, utility });
            }
            validated.push((item, utility as Utility));
        }

        let utility = validated
            .iter()
            .try_fold(0 as Utility, |acc, &(_, u)| acc.checked_add(u))
            .ok_or(InvalidTransaction::UtilityOverflow)?;
        Ok(Self {
            pairs: validated,
            utility,
        })
    }

    pub fn pairs(&self) -> &[(Item, Utility)] {
        &self.pairs
    }

    /// Transaction utility (sum of item utilities)
    pub fn utility(&self) -> Utility {
        self.utility
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Transaction sorted by canonical rank with cached suffix maxima.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTransaction {
    items: Vec<Item>,
    ranks: Vec<usize>,
    utilities: Vec<Utility>,
    /// `suffix_max[k]` is the largest utility strictly after position `k`
    suffix_max: Vec<Utility>,
}

impl StoredTransaction {
    /// Every item of `transaction` must already be ranked in `order`.
    pub fn from_transaction(transaction: &Transaction, order: &OrderSnapshot<'_>) -> Self {
        let mut pairs = transaction.pairs().to_vec();
        order.sort_pairs(&mut pairs);

        let items: Vec<Item> = pairs.iter().map(|&(item, _)| item).collect();
        let ranks: Vec<usize> = items
            .iter()
            .map(|&item| order.rank(item).unwrap_or(usize::MAX))
            .collect();
        debug_assert!(ranks.iter().all(|&rank| rank != usize::MAX), "unranked item stored");
        let utilities: Vec<Utility> = pairs.iter().map(|&(_, u)| u).collect();

        let mut suffix_max = vec![0; utilities.len()];
        let mut running = 0;
        for k in (0..utilities.len()).rev() {
            suffix_max[k] = running;
            running = running.max(utilities[k]);
        }

        Self {
            items,
            ranks,
            utilities,
            suffix_max,
        }
    }

    /// Rebuild the derived fields from items and utilities.
    ///
    /// `None` if the pairs do not form a valid transaction over items ranked
    /// in `order`.
    pub fn rederive(&self, order: &OrderSnapshot<'_>) -> Option<Self> {
        if self.items.len() != self.utilities.len() {
            return None;
        }
        let pairs = self
            .items
            .iter()
            .zip(&self.utilities)
            .map(|(&item, &utility)| {
                order.rank(item)?;
                i64::try_from(utility).ok().map(|utility| (item, utility))
            })
            .collect::<Option<Vec<_>>>()?;

        let transaction = Transaction::new(&pairs).ok()?;
        Some(Self::from_transaction(&transaction, order))
    }

    /// Sum of the item utilities
    pub fn transaction_utility(&self) -> Utility {
        self.utilities.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, position: usize) -> Item {
        self.items[position]
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn utility(&self, position: usize) -> Utility {
        self.utilities[position]
    }

    pub fn rank(&self, position: usize) -> usize {
        self.ranks[position]
    }

    pub fn suffix_max(&self, position: usize) -> Utility {
        self.suffix_max[position]
    }

    /// First position whose item ranks after `rank`; `None` means the start.
    pub fn first_after(&self, rank: Option<usize>) -> usize {
        match rank {
            Some(rank) => self.ranks.partition_point(|&r| r <= rank),
            None => 0,
        }
    }

    pub fn position_of_rank(&self, rank: usize) -> Option<usize> {
        self.ranks.binary_search(&rank).ok()
    }

    /// Utility of `items` in this transaction, `None` if any is missing.
    pub fn utility_of(&self, items: &[Item]) -> Option<Utility> {
        items.iter().try_fold(0, |acc, item| {
            self.items
                .iter()
                .position(|candidate| candidate == item)
                .map(|pos| acc + self.utilities[pos])
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionStore {
    transactions: Vec<StoredTransaction>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transaction: StoredTransaction) -> TransactionId {
        self.transactions.push(transaction);
        self.transactions.len() - 1
    }

    pub fn get(&self, tid: TransactionId) -> &StoredTransaction {
        &self.transactions[tid]
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredTransaction> {
        self.transactions.iter()
    }
}
