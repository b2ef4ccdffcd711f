pub mod search;
pub mod state;

pub use search::SearchEngine;
pub use state::{meets_threshold, EvaluationOutcome, WorkItem};
