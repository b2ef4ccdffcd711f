//! Branch-and-bound re-validation over the itemset-utility tree.
//!
//! The engine never recurses: pending nodes live on an explicit stack whose
//! buffer is reused between runs. A node is evaluated at most once per run,
//! guarded by its recheck flag.

use std::collections::BTreeSet;
use tracing::trace;

use super::state::{meets_threshold, EvaluationOutcome, WorkItem};
use crate::au::error::{MiningError, Result};
use crate::au::stats::OrderSnapshot;
use crate::au::store::TransactionStore;
use crate::au::tree::{bound_term, AUTree, NodeId, NodeStatus, Posting};

#[derive(Debug, Default)]
pub struct SearchEngine {
    stack: Vec<WorkItem>,
    closed: BTreeSet<NodeId>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose closed set mirrors the statuses already stored in `tree`.
    pub fn from_tree(tree: &AUTree) -> Self {
        let closed = tree
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.status == NodeStatus::Closed)
            .map(|(idx, _)| idx)
            .collect();

        Self {
            stack: Vec::new(),
            closed,
        }
    }

    pub fn closed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.closed.iter().copied()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    /// Evaluate `seeds` and everything they expose until the stack is empty.
    ///
    /// Seeds are processed lowest id first. An `OrderingInconsistency` means
    /// the tree is corrupt and is returned as soon as it is observed.
    pub fn run(
        &mut self,
        tree: &mut AUTree,
        store: &TransactionStore,
        order: &OrderSnapshot<'_>,
        minimum: f64,
        seeds: &[NodeId],
    ) -> Result<EvaluationOutcome> {
        let mut outcome = EvaluationOutcome::default();
        self.stack.clear();

        for &node in seeds.iter().rev() {
            self.push(tree, node);
        }

        while let Some(work) = self.stack.pop() {
            let id = work.node;
            if tree.nodes[id].is_root() || !tree.nodes[id].recheck {
                continue;
            }
            tree.nodes[id].recheck = false;
            outcome.evaluated += 1;

            let auub = tree.compute_auub(id);
            let average = tree.average_utility(id);
            if !meets_threshold(auub, average) {
                return Err(MiningError::OrderingInconsistency {
                    itemset: tree.itemset(id),
                    auub,
                    average,
                });
            }

            let previous = tree.nodes[id].status;
            let next = NodeStatus::evaluate(auub, average, minimum);
            tree.nodes[id].status = next;
            trace!(
                node = id,
                utility = work.utility,
                pushed_auub = work.auub,
                auub,
                average,
                ?previous,
                ?next,
                "evaluated node"
            );

            if next == NodeStatus::Closed {
                self.closed.insert(id);
                outcome.closed.push(id);
            } else {
                if previous == NodeStatus::Closed {
                    self.closed.remove(&id);
                    outcome.retracted.push(id);
                }
                if next == NodeStatus::PruneCandidate {
                    outcome.pruned += 1;
                }
            }

            if next.is_extendable() && !tree.nodes[id].expanded {
                let children = expand(tree, store, order, id);
                outcome.expanded += 1;
                for &child in children.iter().rev() {
                    self.push(tree, child);
                }
            }
        }

        Ok(outcome)
    }

    fn push(&mut self, tree: &AUTree, node: NodeId) {
        self.stack.push(WorkItem {
            node,
            utility: tree.nodes[node].utility,
            auub: tree.compute_auub(node),
        });
    }
}

/// Materialise the children of `node` from its postings list.
///
/// Returns the children in processing order.
fn expand(
    tree: &mut AUTree,
    store: &TransactionStore,
    order: &OrderSnapshot<'_>,
    node: NodeId,
) -> Vec<NodeId> {
    let rank = tree.nodes[node].rank;
    let length = tree.nodes[node].length + 1;

    for idx in 0..tree.table[node].postings.len() {
        let posting = tree.table[node].postings[idx];
        let transaction = store.get(posting.tid);

        for k in transaction.first_after(rank)..transaction.len() {
            let utility = posting.utility + transaction.utility(k);
            let bound = bound_term(utility, length, transaction.suffix_max(k));
            tree.extend(
                node,
                transaction.item(k),
                Posting {
                    tid: posting.tid,
                    utility,
                },
                bound,
                order,
            );
        }
    }
    tree.nodes[node].expanded = true;

    let mut children: Vec<NodeId> = tree.nodes[node].children.values().copied().collect();
    children.sort_by(|&a, &b| tree.work_order(a, b));
    children
}
