pub mod mining;

pub use mining::{mine, mine_map};
