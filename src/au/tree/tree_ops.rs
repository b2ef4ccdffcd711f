use std::cmp::Ordering;

use super::tree::{AUNode, AUTree, NodeId, NodeStatus, Posting};
use crate::au::stats::OrderSnapshot;
use crate::au::store::TransactionStore;
use crate::au::{Item, Utility};

/// Contribution of one occurrence to a node's bound.
///
/// An extension of the itemset inside the same transaction averages the
/// itemset's own per-item utility with utilities of items ranked after it,
/// so it can never exceed the larger of the two.
pub fn bound_term(itemset_utility: Utility, length: usize, remaining_max: Utility) -> f64 {
    debug_assert!(length > 0);
    (itemset_utility as f64 / length as f64).max(remaining_max as f64)
}

impl AUTree {
    /// Create or update the child of `parent` for `item` with one more occurrence.
    pub fn extend(
        &mut self,
        parent: NodeId,
        item: Item,
        posting: Posting,
        bound: f64,
        order: &OrderSnapshot<'_>,
    ) -> NodeId {
        let child_index = match self.nodes[parent].children.get(&item) {
            Some(&child_index) => child_index,
            None => {
                let length = self.nodes[parent].length + 1;
                let new_node = AUNode::new_item(item, order.rank(item), parent, length);
                let new_index = self.nodes.len();
                self.nodes.push(new_node);
                self.table.push(Default::default());

                self.nodes[parent].children.insert(item, new_index);
                new_index
            }
        };

        let child = &mut self.nodes[child_index];
        child.utility += posting.utility;
        child.count += 1;
        child.auub += bound;
        child.recheck = true;
        self.table[child_index].postings.push(posting);

        child_index
    }

    /// Cached bound, kept current by `extend`.
    pub fn compute_auub(&self, node: NodeId) -> f64 {
        self.nodes[node].auub
    }

    /// Bound rebuilt from the postings list and the stored transactions.
    pub fn recompute_auub(&self, node: NodeId, store: &TransactionStore) -> f64 {
        let current = &self.nodes[node];
        let Some(rank) = current.rank else {
            return 0.0;
        };

        self.table[node]
            .postings
            .iter()
            .map(|posting| {
                let transaction = store.get(posting.tid);
                let remaining = transaction
                    .position_of_rank(rank)
                    .map_or(0, |pos| transaction.suffix_max(pos));
                bound_term(posting.utility, current.length, remaining)
            })
            .sum()
    }

    pub fn average_utility(&self, node: NodeId) -> f64 {
        let current = &self.nodes[node];
        if current.length == 0 {
            return 0.0;
        }
        current.utility as f64 / current.length as f64
    }

    /// Items from the root down to `node`, in canonical order.
    pub fn path(&self, node: NodeId) -> Vec<Item> {
        let mut path = Vec::with_capacity(self.nodes[node].length);
        let mut current = Some(node);

        while let Some(idx) = current {
            if let Some(item) = self.nodes[idx].item {
                path.push(item);
            }
            current = self.nodes[idx].parent;
        }

        path.reverse();
        path
    }

    /// The node's itemset sorted by item id
    pub fn itemset(&self, node: NodeId) -> Vec<Item> {
        let mut items = self.path(node);
        items.sort_unstable();
        items
    }

    /// Node reached by following `path` from the root.
    pub fn find(&self, path: &[Item]) -> Option<NodeId> {
        path.iter().try_fold(self.root_index, |current, item| {
            self.nodes[current].children.get(item).copied()
        })
    }

    pub fn children_by_rank(&self, node: NodeId) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = self.nodes[node].children.values().copied().collect();
        children.sort_by_key(|&child| self.nodes[child].rank);
        children
    }

    /// Order in which sibling work items are processed: larger bound first,
    /// lower rank on ties.
    pub fn work_order(&self, a: NodeId, b: NodeId) -> Ordering {
        let (left, right) = (&self.nodes[a], &self.nodes[b]);
        right
            .auub
            .partial_cmp(&left.auub)
            .unwrap_or(Ordering::Equal)
            .then(left.rank.cmp(&right.rank))
    }

    pub fn postings(&self, node: NodeId) -> &[Posting] {
        &self.table[node].postings
    }

    pub fn status(&self, node: NodeId) -> NodeStatus {
        self.nodes[node].status
    }

    pub fn expanded_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.expanded).count()
    }

    pub fn recheck_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.recheck)
            .map(|(idx, _)| idx)
            .collect()
    }
}
