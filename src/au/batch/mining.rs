//! From-scratch search over a complete database.
//!
//! Uses the same canonical order and bound as the incremental index, with
//! projected postings instead of a persistent tree. First-level branches
//! are mined in parallel.

use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::au::config::Threshold;
use crate::au::engine::meets_threshold;
use crate::au::error::Result;
use crate::au::stats::ItemTable;
use crate::au::store::{StoredTransaction, Transaction, TransactionStore};
use crate::au::tree::bound_term;
use crate::au::utils::{add_pattern_to_result, merge_levels, results_from_levels, UtilityLevel};
use crate::au::{Item, TransactionId, Utility};

/// Occurrence of the current prefix: transaction, position of its last item, utility
type Projection = (TransactionId, usize, Utility);

pub fn mine<T: AsRef<[(Item, i64)]>>(
    transactions: &[T],
    threshold: Threshold,
) -> Result<Vec<UtilityLevel>> {
    threshold.validate()?;

    let mut table = ItemTable::new();
    let mut validated = Vec::with_capacity(transactions.len());
    for pairs in transactions {
        let transaction = Transaction::new(pairs.as_ref())?;
        table.admit(&transaction)?;
        table.record_transaction(&transaction);
        validated.push(transaction);
    }

    let order = table.snapshot();
    let mut store = TransactionStore::new();
    for transaction in &validated {
        store.push(StoredTransaction::from_transaction(transaction, &order));
    }

    let minimum = threshold.min_average_utility(table.total_utility());
    let first_level = table.items().len();

    let branches: Vec<Vec<UtilityLevel>> = (0..first_level)
        .into_par_iter()
        .map(|rank| {
            let projections: Vec<Projection> = store
                .iter()
                .enumerate()
                .filter_map(|(tid, transaction)| {
                    transaction
                        .position_of_rank(rank)
                        .map(|pos| (tid, pos, transaction.utility(pos)))
                })
                .collect();

            let mut branch_result = Vec::new();
            let mut prefix = vec![table.items()[rank]];
            search(&store, &mut prefix, &projections, minimum, &mut branch_result);
            branch_result
        })
        .collect();

    Ok(merge_levels(branches))
}

pub fn mine_map<T: AsRef<[(Item, i64)]>>(
    transactions: &[T],
    threshold: Threshold,
) -> Result<BTreeMap<Vec<Item>, f64>> {
    mine(transactions, threshold).map(|levels| results_from_levels(&levels))
}

fn search(
    store: &TransactionStore,
    prefix: &mut Vec<Item>,
    projections: &[Projection],
    minimum: f64,
    result: &mut Vec<UtilityLevel>,
) {
    let length = prefix.len();
    let utility: Utility = projections.iter().map(|&(_, _, u)| u).sum();
    let auub: f64 = projections
        .iter()
        .map(|&(tid, pos, u)| bound_term(u, length, store.get(tid).suffix_max(pos)))
        .sum();

    if !meets_threshold(auub, minimum) {
        return;
    }

    let average = utility as f64 / length as f64;
    if meets_threshold(average, minimum) {
        add_pattern_to_result(prefix, average, result);
    }

    let mut extensions: BTreeMap<usize, (Item, Vec<Projection>)> = BTreeMap::new();
    for &(tid, pos, u) in projections {
        let transaction = store.get(tid);
        for k in pos + 1..transaction.len() {
            extensions
                .entry(transaction.rank(k))
                .or_insert_with(|| (transaction.item(k), Vec::new()))
                .1
                .push((tid, k, u + transaction.utility(k)));
        }
    }

    for (item, extended) in extensions.into_values() {
        prefix.push(item);
        search(store, prefix, &extended, minimum, result);
        prefix.pop();
    }
}
