use thiserror::Error;

use super::Item;

/// Why a transaction was turned away before any state was touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidTransaction {
    #[error("transaction has no items")]
    Empty,

    #[error("item {0} appears more than once")]
    DuplicateItem(Item),

    #[error("item {item} has non-positive utility {utility}")]
    NonPositiveUtility { item: Item, utility: i64 },

    #[error("utility total does not fit in 64 bits")]
    UtilityOverflow,
}

/// Errors surfaced by the incremental miner and its collaborators
#[derive(Error, Debug)]
pub enum MiningError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] InvalidTransaction),

    #[error("minimum average utility {0} is out of range")]
    ThresholdOutOfRange(f64),

    /// A node's bound fell below the average utility it must dominate.
    #[error("bound {auub} of itemset {itemset:?} is below its average utility {average}")]
    OrderingInconsistency {
        itemset: Vec<Item>,
        auub: f64,
        average: f64,
    },

    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

pub type Result<T> = std::result::Result<T, MiningError>;
