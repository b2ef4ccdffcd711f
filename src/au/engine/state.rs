use crate::au::tree::{NodeId, NodeStatus};
use crate::au::Utility;

/// Relative slack when comparing derived quantities against the threshold.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

/// `value >= minimum`, forgiving float noise in sums and ratio thresholds.
pub fn meets_threshold(value: f64, minimum: f64) -> bool {
    value >= minimum - THRESHOLD_TOLERANCE * minimum.abs().max(1.0)
}

/// Pending evaluation on the engine stack
#[derive(Debug, Clone, Copy)]
pub struct WorkItem {
    pub node: NodeId,
    pub utility: Utility,
    /// Bound at the time the item was pushed
    pub auub: f64,
}

impl NodeStatus {
    /// Status after evaluating a node against `minimum`.
    pub fn evaluate(auub: f64, average: f64, minimum: f64) -> NodeStatus {
        if !meets_threshold(auub, minimum) {
            NodeStatus::PruneCandidate
        } else if meets_threshold(average, minimum) {
            NodeStatus::Closed
        } else {
            NodeStatus::Promising
        }
    }

    /// The node's subtree may still hold qualifying itemsets
    pub fn is_extendable(self) -> bool {
        matches!(self, NodeStatus::Promising | NodeStatus::Closed)
    }
}

/// What one engine run changed.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    /// Nodes that ended the run Closed, in discovery order
    pub closed: Vec<NodeId>,
    /// Nodes that were Closed before the run and no longer are
    pub retracted: Vec<NodeId>,
    pub evaluated: usize,
    pub expanded: usize,
    pub pruned: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_follows_bound_then_average() {
        assert_eq!(NodeStatus::evaluate(1.5, 1.0, 2.0), NodeStatus::PruneCandidate);
        assert_eq!(NodeStatus::evaluate(3.0, 1.0, 2.0), NodeStatus::Promising);
        assert_eq!(NodeStatus::evaluate(3.0, 2.0, 2.0), NodeStatus::Closed);
        assert!(NodeStatus::Closed.is_extendable());
        assert!(!NodeStatus::PruneCandidate.is_extendable());
        assert!(!NodeStatus::Unvisited.is_extendable());
    }

    #[test]
    fn tolerance_absorbs_ratio_noise() {
        let minimum = 0.1 * 3.0;
        assert!(minimum > 0.3);
        assert!(meets_threshold(0.3, minimum));
        assert!(!meets_threshold(0.29, minimum));
    }
}
