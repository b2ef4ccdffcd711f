use serde::{Deserialize, Serialize};

use super::error::{MiningError, Result};

/// How the minimum average utility is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    /// Fixed minimum average utility.
    Absolute(f64),
    /// Fraction of the total utility of the database seen so far.
    Relative(f64),
}

impl Threshold {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Threshold::Absolute(value) if value.is_finite() && value > 0.0 => Ok(()),
            Threshold::Relative(ratio) if ratio.is_finite() && ratio > 0.0 && ratio <= 1.0 => Ok(()),
            Threshold::Absolute(value) | Threshold::Relative(value) => {
                Err(MiningError::ThresholdOutOfRange(value))
            }
        }
    }

    /// Effective minimum average utility for a database of the given total utility
    pub fn min_average_utility(&self, total_utility: u64) -> f64 {
        match *self {
            Threshold::Absolute(value) => value,
            Threshold::Relative(ratio) => ratio * total_utility as f64,
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Threshold::Relative(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    pub threshold: Threshold,
    /// Re-derive every bound from its postings after each insertion.
    pub verify_after_insert: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::Absolute(1.0),
            verify_after_insert: false,
        }
    }
}

impl MinerConfig {
    pub fn new(min_average_utility: f64) -> Self {
        Self {
            threshold: Threshold::Absolute(min_average_utility),
            ..Self::default()
        }
    }

    pub fn relative(ratio: f64) -> Self {
        Self {
            threshold: Threshold::Relative(ratio),
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_after_insert = enabled;
        self
    }
}
