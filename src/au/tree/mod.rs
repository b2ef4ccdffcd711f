// Tree module - itemset-utility trie and its bookkeeping

mod tree;
mod tree_ops;

pub use tree::{AUNode, AUTree, NodeId, NodeStatus, Posting, TableNode};
pub use tree_ops::bound_term;
