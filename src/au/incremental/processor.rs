//! Per-insertion orchestration.
//!
//! Each insertion runs to completion before the next one starts: statistics,
//! tree propagation, re-validation, then reconciliation of the result set.

use ndarray::ArrayView2;
use std::sync::Arc;
use tracing::debug;

use super::state::{MinerStats, ResultEntry, ResultSnapshot, UpdateReport};
use crate::au::config::{MinerConfig, Threshold};
use crate::au::engine::{meets_threshold, EvaluationOutcome, SearchEngine};
use crate::au::error::{MiningError, Result};
use crate::au::stats::{ItemTable, OrderSnapshot};
use crate::au::store::{StoredTransaction, Transaction, TransactionStore};
use crate::au::tree::{bound_term, AUTree, NodeId, Posting};
use crate::au::utils::{levels_from_results, UtilityLevel};
use crate::au::{Item, TransactionId};

#[derive(Debug)]
pub struct IncrementalMiner {
    pub(crate) config: MinerConfig,
    pub(crate) min_average_utility: f64,
    pub(crate) table: ItemTable,
    pub(crate) store: TransactionStore,
    pub(crate) tree: AUTree,
    pub(crate) engine: SearchEngine,
    pub(crate) results: ResultSnapshot,
}

impl IncrementalMiner {
    pub fn new(config: MinerConfig) -> Result<Self> {
        config.threshold.validate()?;

        Ok(Self {
            min_average_utility: config.threshold.min_average_utility(0),
            config,
            table: ItemTable::new(),
            store: TransactionStore::new(),
            tree: AUTree::new(),
            engine: SearchEngine::new(),
            results: ResultSnapshot::default(),
        })
    }

    /// Empty miner with a fixed minimum average utility.
    pub fn initialize(min_average_utility: f64) -> Result<Self> {
        Self::new(MinerConfig::new(min_average_utility))
    }

    /// Insert one transaction and bring the result set up to date.
    ///
    /// A rejected transaction leaves the miner untouched.
    pub fn insert(&mut self, pairs: &[(Item, i64)]) -> Result<UpdateReport> {
        let transaction = Transaction::new(pairs)?;
        self.table.admit(&transaction)?;

        let new_items = self.table.record_transaction(&transaction);
        let order = self.table.snapshot();
        let tid = self
            .store
            .push(StoredTransaction::from_transaction(&transaction, &order));

        let touched = propagate(&mut self.tree, self.store.get(tid), tid, &order);

        let minimum = self
            .config
            .threshold
            .min_average_utility(self.table.total_utility());
        let mut seeds = touched.clone();
        if minimum != self.min_average_utility {
            // Closed itemsets untouched by this transaction may have fallen
            // below a raised threshold.
            for node in self.engine.closed() {
                self.tree.nodes[node].recheck = true;
                seeds.push(node);
            }
            seeds.sort_unstable();
            seeds.dedup();
        }
        self.min_average_utility = minimum;

        let outcome = self
            .engine
            .run(&mut self.tree, &self.store, &order, minimum, &seeds)?;

        let mut report = UpdateReport {
            tid,
            min_average_utility: minimum,
            new_items,
            touched_nodes: touched.len(),
            evaluated_nodes: outcome.evaluated,
            ..UpdateReport::default()
        };
        self.reconcile(&outcome, &mut report);

        debug!(
            tid,
            items = transaction.len(),
            new_items,
            touched = touched.len(),
            evaluated = outcome.evaluated,
            expanded = outcome.expanded,
            pruned = outcome.pruned,
            added = report.added.len(),
            retracted = report.retracted.len(),
            updated = report.updated.len(),
            "inserted transaction"
        );

        if self.config.verify_after_insert {
            self.verify()?;
        }

        Ok(report)
    }

    /// Insert transactions in order, stopping at the first rejected one.
    pub fn insert_batch<I, T>(&mut self, transactions: I) -> Result<Vec<UpdateReport>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[(Item, i64)]>,
    {
        transactions
            .into_iter()
            .map(|transaction| self.insert(transaction.as_ref()))
            .collect()
    }

    /// Insert each row of a dense utility matrix; column index is the item,
    /// zero means absent and all-zero rows are skipped.
    pub fn insert_matrix(&mut self, matrix: ArrayView2<i64>) -> Result<Vec<UpdateReport>> {
        let mut reports = Vec::with_capacity(matrix.nrows());

        for row in matrix.rows() {
            let pairs: Vec<(Item, i64)> = row
                .iter()
                .enumerate()
                .filter(|&(_, &utility)| utility != 0)
                .map(|(item, &utility)| (item, utility))
                .collect();

            if !pairs.is_empty() {
                reports.push(self.insert(&pairs)?);
            }
        }

        Ok(reports)
    }

    /// Snapshot of the qualifying itemsets; later insertions do not affect it.
    pub fn current_results(&self) -> ResultSnapshot {
        Arc::clone(&self.results)
    }

    pub fn result_levels(&self) -> Vec<UtilityLevel> {
        levels_from_results(&self.results)
    }

    pub fn min_average_utility(&self) -> f64 {
        self.min_average_utility
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Turn re-derivation of every bound after each insertion on or off.
    pub fn set_verification(&mut self, enabled: bool) {
        self.config.verify_after_insert = enabled;
    }

    pub fn threshold(&self) -> Threshold {
        self.config.threshold
    }

    pub fn order(&self) -> OrderSnapshot<'_> {
        self.table.snapshot()
    }

    pub fn item_table(&self) -> &ItemTable {
        &self.table
    }

    pub fn tree(&self) -> &AUTree {
        &self.tree
    }

    pub fn stats(&self) -> MinerStats {
        MinerStats {
            transactions: self.store.len(),
            items: self.table.len(),
            tree_nodes: self.tree.len(),
            expanded_nodes: self.tree.expanded_count(),
            results: self.results.len(),
            total_utility: self.table.total_utility(),
            min_average_utility: self.min_average_utility,
        }
    }

    /// Check every cached aggregate against its postings list and every
    /// bound against the average utility it must dominate.
    pub fn verify(&self) -> Result<()> {
        for id in 0..self.tree.len() {
            let node = &self.tree.nodes[id];
            if node.is_root() {
                continue;
            }

            let postings = self.tree.postings(id);
            let utility: u64 = postings.iter().map(|posting| posting.utility).sum();
            let recomputed = self.tree.recompute_auub(id, &self.store);
            let average = self.tree.average_utility(id);
            let drift = (recomputed - node.auub).abs();

            if utility != node.utility
                || postings.len() != node.count
                || drift > 1e-9 * recomputed.abs().max(1.0)
                || !meets_threshold(node.auub, average)
            {
                return Err(MiningError::OrderingInconsistency {
                    itemset: self.tree.itemset(id),
                    auub: node.auub,
                    average,
                });
            }
        }

        Ok(())
    }

    /// Replace the result set with one reflecting `outcome`.
    fn reconcile(&mut self, outcome: &EvaluationOutcome, report: &mut UpdateReport) {
        if outcome.closed.is_empty() && outcome.retracted.is_empty() {
            return;
        }

        let mut next = (*self.results).clone();

        for &node in &outcome.retracted {
            let itemset = self.tree.itemset(node);
            if let Some(average_utility) = next.remove(&itemset) {
                report.retracted.push(ResultEntry {
                    itemset,
                    average_utility,
                });
            }
        }

        for &node in &outcome.closed {
            let itemset = self.tree.itemset(node);
            let average_utility = self.tree.average_utility(node);
            match next.insert(itemset.clone(), average_utility) {
                None => report.added.push(ResultEntry {
                    itemset,
                    average_utility,
                }),
                Some(previous) if previous != average_utility => {
                    report.updated.push(ResultEntry {
                        itemset,
                        average_utility,
                    })
                }
                Some(_) => {}
            }
        }

        self.results = Arc::new(next);
    }
}

/// Push one stored transaction down every expanded branch it reaches.
///
/// Only children of expanded nodes are created or updated; an unexpanded
/// node receives its own occurrence and is left for the engine to expand
/// from its postings. Returns the touched nodes sorted by id.
fn propagate(
    tree: &mut AUTree,
    transaction: &StoredTransaction,
    tid: TransactionId,
    order: &OrderSnapshot<'_>,
) -> Vec<NodeId> {
    let mut touched = Vec::new();
    let mut stack = vec![(tree.root_index, 0usize, 0u64)];

    while let Some((node, start, utility)) = stack.pop() {
        let length = tree.nodes[node].length + 1;

        for k in start..transaction.len() {
            let child_utility = utility + transaction.utility(k);
            let bound = bound_term(child_utility, length, transaction.suffix_max(k));
            let child = tree.extend(
                node,
                transaction.item(k),
                Posting {
                    tid,
                    utility: child_utility,
                },
                bound,
                order,
            );
            touched.push(child);

            if tree.nodes[child].expanded {
                stack.push((child, k + 1, child_utility));
            }
        }
    }

    touched.sort_unstable();
    debug_assert!(touched.iter().all(|&node| tree.nodes[node].recheck));
    touched
}
