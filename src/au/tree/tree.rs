use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::au::{Item, TransactionId, Utility};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    Unvisited,
    Promising,
    PruneCandidate,
    Closed,
}

/// One occurrence of a node's itemset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub tid: TransactionId,
    /// Utility of the itemset in that transaction
    pub utility: Utility,
}

#[derive(Debug, Clone)]
pub struct AUNode {
    pub item: Option<Item>,
    /// Canonical rank of `item`
    pub rank: Option<usize>,
    pub parent: Option<NodeId>,
    /// Itemset length, 0 for the root
    pub length: usize,
    pub utility: Utility,
    pub count: usize,
    pub auub: f64,
    pub status: NodeStatus,
    pub recheck: bool,
    /// Children have been materialised from the postings list
    pub expanded: bool,
    pub children: HashMap<Item, NodeId>,
}

/// Bookkeeping kept beside each node
#[derive(Debug, Clone, Default)]
pub struct TableNode {
    pub postings: Vec<Posting>,
}

#[derive(Debug, Clone)]
pub struct AUTree {
    pub nodes: Vec<AUNode>,
    pub table: Vec<TableNode>,
    pub root_index: NodeId,
}

impl AUNode {
    pub fn new_root() -> Self {
        Self {
            item: None,
            rank: None,
            parent: None,
            length: 0,
            utility: 0,
            count: 0,
            auub: 0.0,
            status: NodeStatus::Promising,
            recheck: false,
            expanded: true,
            children: HashMap::new(),
        }
    }

    pub fn new_item(item: Item, rank: Option<usize>, parent: NodeId, length: usize) -> Self {
        Self {
            item: Some(item),
            rank,
            parent: Some(parent),
            length,
            utility: 0,
            count: 0,
            auub: 0.0,
            status: NodeStatus::Unvisited,
            recheck: true,
            expanded: false,
            children: HashMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.item.is_none()
    }
}

impl Default for AUTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AUTree {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(AUNode::new_root());

        Self {
            nodes,
            table: vec![TableNode::default()],
            root_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}
