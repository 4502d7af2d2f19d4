//! # Substrate Trait
//!
//! The contract between the search core and whatever engine executes a
//! round: map every record, group the emissions by key, merge each group.
//!
//! ## Implementations
//!
//! | Substrate | Module | Description |
//! |-----------|--------|-------------|
//! | `MemorySubstrate` | `memory` | In-process, partitioned across worker threads |
//! | `PersistingSubstrate` | `persist` | Wraps another substrate, writes each round to disk |
//!
//! A substrate owns scheduling, shuffling and retries. It must deliver the
//! complete emission set for a key to `merge` (at-least-once is fine;
//! merging tolerates replays) and must not start merging before mapping
//! is finished.

pub mod memory;
pub mod persist;

use async_trait::async_trait;

use crate::model::*;
use crate::Result;

pub use memory::MemorySubstrate;
pub use persist::PersistingSubstrate;

/// Per-record map step.
pub type PropagateFn = fn(&NodeId, &NodeRecord) -> Emissions;

/// Per-key merge step.
pub type MergeFn = fn(&NodeId, &[EmittedValue]) -> Result<NodeRecord>;

// ============================================================================
// Capabilities
// ============================================================================

/// What a substrate does besides executing rounds.
///
/// All fields default to false / one. Substrates override via `capabilities()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstrateCapabilities {
    /// Number of workers a round is spread across.
    pub parallelism: usize,
    /// Whether round outputs survive the process.
    pub persists_rounds: bool,
}

impl Default for SubstrateCapabilities {
    fn default() -> Self {
        Self { parallelism: 1, persists_rounds: false }
    }
}

// ============================================================================
// Substrate Trait
// ============================================================================

/// Executes one bulk-synchronous round.
#[async_trait]
pub trait Substrate: Send + Sync + 'static {
    /// Run `propagate` over every entry of `dataset`, group the emissions
    /// by key, and apply `merge` once per key.
    ///
    /// Every key of `dataset` must appear in the result. Total failure of
    /// the round is `Error::SubstrateExecutionFailure`; a per-key merge
    /// error fails the round with that error.
    async fn run_round(
        &self,
        round: u64,
        dataset: &RoundDataset,
        propagate: PropagateFn,
        merge: MergeFn,
    ) -> Result<RoundDataset>;

    /// Report what this substrate can do.
    fn capabilities(&self) -> SubstrateCapabilities {
        SubstrateCapabilities::default()
    }
}

#[async_trait]
impl<S: Substrate + ?Sized> Substrate for std::sync::Arc<S> {
    async fn run_round(
        &self,
        round: u64,
        dataset: &RoundDataset,
        propagate: PropagateFn,
        merge: MergeFn,
    ) -> Result<RoundDataset> {
        (**self).run_round(round, dataset, propagate, merge).await
    }

    fn capabilities(&self) -> SubstrateCapabilities {
        (**self).capabilities()
    }
}
