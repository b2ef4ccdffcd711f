//! Persisted form of a miner.
//!
//! A checkpoint holds the item order table, the stored transactions and,
//! for every tree node, its path, aggregates, status and postings. Nodes
//! are written in id order so a parent always precedes its children.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};
use std::sync::Arc;

use crate::au::config::MinerConfig;
use crate::au::engine::SearchEngine;
use crate::au::error::{MiningError, Result};
use crate::au::incremental::IncrementalMiner;
use crate::au::stats::{ItemStats, ItemTable, OrderSnapshot};
use crate::au::store::TransactionStore;
use crate::au::tree::{AUNode, AUTree, NodeId, NodeStatus, Posting};
use crate::au::{Item, Utility};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub path: Vec<Item>,
    pub utility: Utility,
    pub count: usize,
    pub auub: f64,
    pub status: NodeStatus,
    pub expanded: bool,
    pub postings: Vec<Posting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub config: MinerConfig,
    pub min_average_utility: f64,
    pub item_order: Vec<Item>,
    pub item_stats: Vec<ItemStats>,
    pub total_utility: Utility,
    pub num_transactions: usize,
    pub transactions: TransactionStore,
    pub nodes: Vec<NodeRecord>,
}

impl Checkpoint {
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self).map_err(|e| MiningError::Checkpoint(e.to_string()))
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| MiningError::Checkpoint(e.to_string()))
    }
}

impl IncrementalMiner {
    pub fn checkpoint(&self) -> Checkpoint {
        let nodes = (0..self.tree.len())
            .filter(|&id| !self.tree.nodes[id].is_root())
            .map(|id| {
                let node = &self.tree.nodes[id];
                NodeRecord {
                    path: self.tree.path(id),
                    utility: node.utility,
                    count: node.count,
                    auub: node.auub,
                    status: node.status,
                    expanded: node.expanded,
                    postings: self.tree.postings(id).to_vec(),
                }
            })
            .collect();

        Checkpoint {
            config: self.config.clone(),
            min_average_utility: self.min_average_utility,
            item_order: self.table.items().to_vec(),
            item_stats: self.table.stats_in_order(),
            total_utility: self.table.total_utility(),
            num_transactions: self.table.num_transactions(),
            transactions: self.store.clone(),
            nodes,
        }
    }

    /// Resume from a checkpoint without replaying any transaction.
    pub fn restore(checkpoint: Checkpoint) -> Result<Self> {
        checkpoint.config.threshold.validate()?;
        if checkpoint.item_order.len() != checkpoint.item_stats.len() {
            return Err(MiningError::Checkpoint(format!(
                "{} ordered items but {} statistics entries",
                checkpoint.item_order.len(),
                checkpoint.item_stats.len()
            )));
        }
        if checkpoint.num_transactions != checkpoint.transactions.len() {
            return Err(MiningError::Checkpoint(format!(
                "{} transactions recorded but {} stored",
                checkpoint.num_transactions,
                checkpoint.transactions.len()
            )));
        }

        for (rank, stats) in checkpoint.item_stats.iter().enumerate() {
            if stats.rank != rank {
                return Err(MiningError::Checkpoint(format!(
                    "item {} stored at rank {rank} claims rank {}",
                    checkpoint.item_order[rank], stats.rank
                )));
            }
        }
        let distinct: HashSet<Item> = checkpoint.item_order.iter().copied().collect();
        if distinct.len() != checkpoint.item_order.len() {
            return Err(MiningError::Checkpoint("item order repeats an item".to_string()));
        }

        let table = ItemTable::from_parts(
            checkpoint.item_order,
            checkpoint.item_stats,
            checkpoint.total_utility,
            checkpoint.num_transactions,
        );

        let mut tree = AUTree::new();
        let mut results = BTreeMap::new();
        {
            let order = table.snapshot();

            let mut total: Utility = 0;
            for (tid, stored) in checkpoint.transactions.iter().enumerate() {
                if stored.rederive(&order).as_ref() != Some(stored) {
                    return Err(MiningError::Checkpoint(format!(
                        "transaction {tid} is inconsistent with the item order"
                    )));
                }
                total = total
                    .checked_add(stored.transaction_utility())
                    .ok_or_else(|| MiningError::Checkpoint("utility total overflows".to_string()))?;
            }
            if total != table.total_utility() {
                return Err(MiningError::Checkpoint(format!(
                    "transactions sum to {total} but the table records {}",
                    table.total_utility()
                )));
            }

            for record in checkpoint.nodes {
                let Some((&item, parent_path)) = record.path.split_last() else {
                    return Err(MiningError::Checkpoint("node with empty path".to_string()));
                };
                let parent = tree.find(parent_path).ok_or_else(|| {
                    MiningError::Checkpoint(format!("node {:?} precedes its parent", record.path))
                })?;
                if tree.nodes[parent].children.contains_key(&item) {
                    return Err(MiningError::Checkpoint(format!(
                        "duplicate node {:?}",
                        record.path
                    )));
                }
                let ranks: Option<Vec<usize>> =
                    record.path.iter().map(|&step| order.rank(step)).collect();
                match ranks {
                    None => {
                        return Err(MiningError::Checkpoint(format!(
                            "unranked item in {:?}",
                            record.path
                        )))
                    }
                    Some(ranks) if ranks.windows(2).any(|pair| pair[0] >= pair[1]) => {
                        return Err(MiningError::Checkpoint(format!(
                            "path {:?} is not in canonical order",
                            record.path
                        )))
                    }
                    Some(_) => {}
                }
                if record.postings.windows(2).any(|pair| pair[0].tid >= pair[1].tid) {
                    return Err(MiningError::Checkpoint(format!(
                        "postings of {:?} are not in transaction order",
                        record.path
                    )));
                }
                for posting in &record.postings {
                    if posting.tid >= checkpoint.transactions.len() {
                        return Err(MiningError::Checkpoint(format!(
                            "posting refers to missing transaction {}",
                            posting.tid
                        )));
                    }
                    let actual = checkpoint
                        .transactions
                        .get(posting.tid)
                        .utility_of(&record.path);
                    if actual != Some(posting.utility) {
                        return Err(MiningError::Checkpoint(format!(
                            "posting of {:?} in transaction {} records utility {} but the transaction holds {:?}",
                            record.path, posting.tid, posting.utility, actual
                        )));
                    }
                }

                let id = tree.extend_restored(parent, item, &order);
                let node = &mut tree.nodes[id];
                node.utility = record.utility;
                node.count = record.count;
                node.auub = record.auub;
                node.status = record.status;
                node.expanded = record.expanded;
                node.recheck = false;
                tree.table[id].postings = record.postings;

                if record.status == NodeStatus::Closed {
                    results.insert(tree.itemset(id), tree.average_utility(id));
                }
            }
        }

        let engine = SearchEngine::from_tree(&tree);
        let miner = Self {
            config: checkpoint.config,
            min_average_utility: checkpoint.min_average_utility,
            table,
            store: checkpoint.transactions,
            tree,
            engine,
            results: Arc::new(results),
        };
        miner.verify()?;
        Ok(miner)
    }
}

impl AUTree {
    /// Attach an empty child without recording an occurrence.
    fn extend_restored(&mut self, parent: NodeId, item: Item, order: &OrderSnapshot<'_>) -> NodeId {
        let length = self.nodes[parent].length + 1;
        let index = self.nodes.len();
        self.nodes
            .push(AUNode::new_item(item, order.rank(item), parent, length));
        self.table.push(Default::default());
        self.nodes[parent].children.insert(item, index);
        index
    }
}
