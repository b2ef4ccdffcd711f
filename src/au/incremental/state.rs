use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::au::{Item, TransactionId};

/// Point-in-time view of the qualifying itemsets and their average utilities
pub type ResultSnapshot = Arc<BTreeMap<Vec<Item>, f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    /// Items sorted by id
    pub itemset: Vec<Item>,
    pub average_utility: f64,
}

/// Changes to the result set caused by one insertion
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    pub tid: TransactionId,
    /// Newly qualifying itemsets, in discovery order
    pub added: Vec<ResultEntry>,
    /// Itemsets that stopped qualifying, with their last reported value
    pub retracted: Vec<ResultEntry>,
    /// Itemsets that still qualify with a new average utility
    pub updated: Vec<ResultEntry>,
    pub min_average_utility: f64,
    pub new_items: usize,
    pub touched_nodes: usize,
    pub evaluated_nodes: usize,
}

impl UpdateReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.retracted.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinerStats {
    pub transactions: usize,
    pub items: usize,
    pub tree_nodes: usize,
    pub expanded_nodes: usize,
    pub results: usize,
    pub total_utility: u64,
    pub min_average_utility: f64,
}
