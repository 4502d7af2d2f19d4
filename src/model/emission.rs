//! Intermediate values produced by propagation and consumed by merging.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use super::{Distance, NodeId};

/// A value addressed to one node key within a round.
///
/// The variant is the tag: an empty adjacency list is still an
/// `Adjacency` payload, never a missing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EmittedValue {
    /// The node's own neighbor list, emitted once per round by the node itself.
    Adjacency(Vec<NodeId>),
    /// A proposed distance for the receiving node.
    Candidate(Distance),
}

impl EmittedValue {
    pub fn as_candidate(&self) -> Option<Distance> {
        match self {
            EmittedValue::Candidate(d) => Some(*d),
            EmittedValue::Adjacency(_) => None,
        }
    }
}

/// One keyed output of the propagation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emission {
    pub key: NodeId,
    pub value: EmittedValue,
}

impl Emission {
    pub fn adjacency(key: NodeId, adjacency: Vec<NodeId>) -> Self {
        Self { key, value: EmittedValue::Adjacency(adjacency) }
    }

    pub fn candidate(key: NodeId, distance: Distance) -> Self {
        Self { key, value: EmittedValue::Candidate(distance) }
    }
}

/// All emissions of one node in one round. Most nodes have a handful of
/// neighbors, so these usually stay inline.
pub type Emissions = SmallVec<[Emission; 4]>;
