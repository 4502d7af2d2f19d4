//! Node identity and the per-node record carried between rounds.

use serde::{Deserialize, Serialize};
use super::Distance;

/// Opaque node identifier.
///
/// Ordered lexicographically; that order is the canonical order of a
/// [`RoundDataset`](super::RoundDataset).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Persistent state of one node: its (static) out-neighbors and the best
/// hop distance known so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub adjacency: Vec<NodeId>,
    pub distance: Distance,
}

impl NodeRecord {
    pub fn new(adjacency: Vec<NodeId>, distance: Distance) -> Self {
        Self { adjacency, distance }
    }

    /// A seed: distance zero.
    pub fn seed(adjacency: impl IntoIterator<Item = impl Into<NodeId>>) -> Self {
        Self::new(adjacency.into_iter().map(Into::into).collect(), Distance::ZERO)
    }

    /// A node no seed has reached yet.
    pub fn unreached(adjacency: impl IntoIterator<Item = impl Into<NodeId>>) -> Self {
        Self::new(adjacency.into_iter().map(Into::into).collect(), Distance::Unknown)
    }

    pub fn is_seed(&self) -> bool {
        self.distance == Distance::ZERO
    }

    pub fn has_neighbor(&self, id: &str) -> bool {
        self.adjacency.iter().any(|n| n.as_str() == id)
    }
}
