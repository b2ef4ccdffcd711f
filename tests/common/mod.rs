#![allow(dead_code)]

use std::collections::BTreeMap;

use haui::au::{meets_threshold, Item, Threshold};
use proptest::prelude::*;

pub type Database = Vec<Vec<(Item, i64)>>;

/// Total utility of every itemset that occurs in `transactions`.
pub fn itemset_utilities(transactions: &[Vec<(Item, i64)>]) -> BTreeMap<Vec<Item>, i64> {
    let mut utilities = BTreeMap::new();

    for transaction in transactions {
        let n = transaction.len();
        for mask in 1u32..(1 << n) {
            let mut itemset = Vec::new();
            let mut utility = 0;
            for (idx, &(item, u)) in transaction.iter().enumerate() {
                if mask & (1 << idx) != 0 {
                    itemset.push(item);
                    utility += u;
                }
            }
            itemset.sort_unstable();
            *utilities.entry(itemset).or_insert(0) += utility;
        }
    }

    utilities
}

/// Qualifying itemsets found by enumerating every subset of every transaction.
pub fn brute_force(transactions: &[Vec<(Item, i64)>], threshold: Threshold) -> BTreeMap<Vec<Item>, f64> {
    let total: i64 = transactions.iter().flatten().map(|&(_, u)| u).sum();
    let minimum = threshold.min_average_utility(total as u64);

    itemset_utilities(transactions)
        .into_iter()
        .map(|(itemset, utility)| {
            let average = utility as u64 as f64 / itemset.len() as f64;
            (itemset, average)
        })
        .filter(|&(_, average)| meets_threshold(average, minimum))
        .collect()
}

pub fn transaction_strategy(max_item: Item) -> impl Strategy<Value = Vec<(Item, i64)>> {
    proptest::collection::btree_map(0..max_item, 1i64..12, 1..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

pub fn database_strategy() -> impl Strategy<Value = Database> {
    proptest::collection::vec(transaction_strategy(10), 1..20)
}

pub fn threshold_strategy() -> impl Strategy<Value = Threshold> {
    prop_oneof![
        (2u32..40).prop_map(|t| Threshold::Absolute(t as f64 / 2.0)),
        (1u32..40).prop_map(|r| Threshold::Relative(r as f64 / 100.0)),
    ]
}
