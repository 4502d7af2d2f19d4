//! Distance propagation: the "map" half of a round.
//!
//! Pure function of one record: it reads nothing else and writes nothing,
//! so a substrate may run any number of instances concurrently.

use smallvec::SmallVec;
use tracing::trace;

use crate::model::*;

/// Emit everything one node contributes to the next round.
///
/// ```text
/// A (B,D),0   →   A ⇐ Adjacency[B,D]
///                 A ⇐ Candidate 0
///                 B ⇐ Candidate 1
///                 D ⇐ Candidate 1
/// ```
///
/// The self-candidate keeps the node's current distance alive even when no
/// predecessor offers anything better. An empty adjacency list still emits
/// its (empty) payload.
pub fn propagate(id: &NodeId, record: &NodeRecord) -> Emissions {
    let mut out: Emissions = SmallVec::with_capacity(record.adjacency.len() + 2);

    out.push(Emission::adjacency(id.clone(), record.adjacency.clone()));
    out.push(Emission::candidate(id.clone(), record.distance));
    trace!(node = %id, neighbors = record.adjacency.len(), distance = %record.distance, "propagate");

    let relaxed = record.distance.relax();
    for neighbor in &record.adjacency {
        trace!(from = %id, to = %neighbor, distance = %relaxed, "candidate");
        out.push(Emission::candidate(neighbor.clone(), relaxed));
    }

    out
}
