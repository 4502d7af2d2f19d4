//! Distance merging: the "reduce" half of a round.
//!
//! Receives every value emitted toward one key, in whatever order the
//! substrate delivers them, and rebuilds that node's record.

use tracing::trace;

use crate::model::*;
use crate::{Error, Result};

/// Rebuild one node's record from its round emissions.
///
/// Exactly one adjacency payload is expected. Identical repeats are
/// tolerated, since at-least-once delivery may replay a
/// producer; two payloads that disagree are a data error. A key with no
/// payload at all means the node's own propagation was lost, or the key
/// is a neighbor that was never a node. That is an error, never an empty
/// adjacency list.
///
/// The distance is the minimum over all known candidates and is
/// independent of arrival order.
pub fn merge(id: &NodeId, values: &[EmittedValue]) -> Result<NodeRecord> {
    let mut adjacency: Option<&Vec<NodeId>> = None;
    let mut best = Distance::Unknown;
    let mut candidates = 0usize;

    for value in values {
        match value {
            EmittedValue::Adjacency(list) => match adjacency {
                Some(existing) if existing != list => {
                    return Err(Error::ConflictingAdjacency(id.clone()));
                }
                _ => adjacency = Some(list),
            },
            EmittedValue::Candidate(d) => {
                candidates += 1;
                best = best.best(*d);
            }
        }
    }

    let adjacency = adjacency.ok_or_else(|| Error::MissingAdjacencyPayload(id.clone()))?;
    trace!(node = %id, candidates, distance = %best, "merge");

    Ok(NodeRecord::new(adjacency.clone(), best))
}
