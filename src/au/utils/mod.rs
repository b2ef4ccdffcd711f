pub mod storage;

pub use storage::{
    add_pattern_to_result, levels_from_results, merge_levels, results_from_levels, ItemsetStorage,
    UtilityLevel,
};
