//! Convergence detection between consecutive round datasets.
//!
//! A round has converged when its output is structurally identical to its
//! input: same keys, same adjacency lists, same distances. Comparing whole
//! records (not just distances) means a substrate that corrupts topology
//! shows up as non-convergence instead of a silently wrong answer.

use serde::{Deserialize, Serialize};

use crate::model::*;

/// Exact equality of two datasets in canonical key order.
///
/// Datasets of different sizes are simply "not converged".
pub fn has_converged(previous: &RoundDataset, next: &RoundDataset) -> bool {
    previous.len() == next.len() && previous.iter().eq(next.iter())
}

/// What changed between two consecutive datasets. Diagnostic only; the
/// stopping decision is [`has_converged`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDelta {
    /// Nodes whose distance differs.
    pub distance_changes: usize,
    /// Nodes that went from unknown to a concrete distance.
    pub newly_reached: usize,
    /// Nodes whose adjacency list differs. Non-zero means a substrate bug.
    pub topology_changes: usize,
    /// Keys present on only one side.
    pub key_changes: usize,
    /// Nodes with a concrete distance after the round.
    pub reached: usize,
}

impl RoundDelta {
    pub fn between(previous: &RoundDataset, next: &RoundDataset) -> Self {
        let mut delta = RoundDelta { reached: next.reached(), ..Default::default() };

        for (id, after) in next.iter() {
            let Some(before) = previous.get(id.as_str()) else {
                delta.key_changes += 1;
                continue;
            };
            if before.distance != after.distance {
                delta.distance_changes += 1;
                if !before.distance.is_known() {
                    delta.newly_reached += 1;
                }
            }
            if before.adjacency != after.adjacency {
                delta.topology_changes += 1;
            }
        }
        delta.key_changes += previous.keys().filter(|id| !next.contains(id.as_str())).count();

        delta
    }

    pub fn is_empty(&self) -> bool {
        self.distance_changes == 0 && self.topology_changes == 0 && self.key_changes == 0
    }
}
