//! RoundDataset: the complete graph state after a round.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use super::{Distance, NodeId, NodeRecord};

/// Mapping from node id to exactly one [`NodeRecord`].
///
/// Backed by a `BTreeMap`, so iteration is always in canonical key order
/// no matter how (or on how many workers) the dataset was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundDataset {
    records: BTreeMap<NodeId, NodeRecord>,
}

impl RoundDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(id, neighbors)` pairs where every id in `seeds` starts at
    /// distance zero and everything else is unknown.
    pub fn seeded<I, A, N>(graph: I, seeds: &[&str]) -> Self
    where
        I: IntoIterator<Item = (N, A)>,
        A: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        graph
            .into_iter()
            .map(|(id, adjacency)| {
                let id = id.into();
                let record = if seeds.contains(&id.as_str()) {
                    NodeRecord::seed(adjacency)
                } else {
                    NodeRecord::unreached(adjacency)
                };
                (id, record)
            })
            .collect()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, id: NodeId, record: NodeRecord) -> Option<NodeRecord> {
        self.records.insert(id, record)
    }

    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn distance(&self, id: &str) -> Option<Distance> {
        self.get(id).map(|r| r.distance)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeRecord)> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NodeId> {
        self.records.keys()
    }

    /// Whether both datasets hold exactly the same node keys.
    pub fn same_keys(&self, other: &RoundDataset) -> bool {
        self.len() == other.len() && self.keys().eq(other.keys())
    }

    /// Number of nodes with a concrete distance.
    pub fn reached(&self) -> usize {
        self.records.values().filter(|r| r.distance.is_known()).count()
    }
}

impl FromIterator<(NodeId, NodeRecord)> for RoundDataset {
    fn from_iter<T: IntoIterator<Item = (NodeId, NodeRecord)>>(iter: T) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}

impl Extend<(NodeId, NodeRecord)> for RoundDataset {
    fn extend<T: IntoIterator<Item = (NodeId, NodeRecord)>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl IntoIterator for RoundDataset {
    type Item = (NodeId, NodeRecord);
    type IntoIter = std::collections::btree_map::IntoIter<NodeId, NodeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RoundDataset {
    type Item = (&'a NodeId, &'a NodeRecord);
    type IntoIter = std::collections::btree_map::Iter<'a, NodeId, NodeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl From<BTreeMap<NodeId, NodeRecord>> for RoundDataset {
    fn from(records: BTreeMap<NodeId, NodeRecord>) -> Self {
        Self { records }
    }
}
