pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod incremental;
pub mod reader;
pub mod sink;
pub mod stats;
pub mod store;
pub mod tree;
pub mod utils;


pub type Item = usize;
pub type Utility = u64;
pub type TransactionId = usize;

pub use batch::{mine, mine_map};
pub use checkpoint::Checkpoint;
pub use config::{MinerConfig, Threshold};
pub use engine::meets_threshold;
pub use error::{InvalidTransaction, MiningError};
pub use incremental::{IncrementalMiner, MinerStats, ResultEntry, ResultSnapshot, UpdateReport};
pub use reader::{ReaderError, TransactionReader};
pub use sink::{LogSink, ReportSink, VecSink};
pub use stats::{ItemTable, OrderSnapshot};
pub use tree::{AUTree, NodeStatus};
pub use utils::UtilityLevel;
