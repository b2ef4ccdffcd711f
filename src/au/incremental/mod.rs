pub mod processor;
pub mod state;

pub use processor::IncrementalMiner;
pub use state::{MinerStats, ResultEntry, ResultSnapshot, UpdateReport};
