//! # bfs-rs: Bulk-Synchronous Breadth-First Search
//!
//! Computes, for every node of a graph, its hop distance from a set of seed
//! nodes by running synchronous rounds until nothing changes.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Substrate` is the contract between the search core and
//!    whatever executes a round (threads, a cluster, a test double)
//! 2. **Pure steps**: propagation reads one record, merging reads one key's
//!    values; neither touches shared state
//! 3. **Structural convergence**: a round converged when its output equals
//!    its input, compared in canonical key order
//! 4. **Injected observability**: progress goes to a `RoundObserver`, never
//!    to global state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bfs_rs::{RoundDataset, Distance};
//!
//! # async fn example() -> bfs_rs::Result<()> {
//! let graph = RoundDataset::seeded(
//!     [("A", vec!["B"]), ("B", vec!["C"]), ("C", vec![])],
//!     &["A"],
//! );
//!
//! let result = bfs_rs::shortest_hops(graph).await?;
//! assert_eq!(result.rounds, 3);
//! assert_eq!(result.dataset.distance("C"), Some(Distance::Hops(2)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Round
//!
//! ```text
//! dataset ──propagate──▶ (key, value)* ──group by key──▶ merge ──▶ dataset'
//!                                                           │
//!                        has_converged(dataset, dataset') ◀─┘
//! ```
//!
//! ## Substrates
//!
//! | Substrate | Description |
//! |-----------|-------------|
//! | `MemorySubstrate` | In-process, partitioned across worker threads |
//! | `PersistingSubstrate` | Wraps another substrate and writes each round to disk |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod propagate;
pub mod merge;
pub mod convergence;
pub mod coordinator;
pub mod substrate;
pub mod codec;
pub mod config;
pub mod observe;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    NodeId, NodeRecord, Distance, RoundDataset,
    Emission, EmittedValue, Emissions, UNKNOWN_RAW,
};

// ============================================================================
// Re-exports: Core steps
// ============================================================================

pub use propagate::propagate;
pub use merge::merge;
pub use convergence::{has_converged, RoundDelta};
pub use coordinator::{Coordinator, Converged, AbortHandle};

// ============================================================================
// Re-exports: Substrate, config, observers
// ============================================================================

pub use substrate::{
    Substrate, SubstrateCapabilities, MemorySubstrate, PersistingSubstrate,
    PropagateFn, MergeFn,
};
pub use config::{SearchConfig, MalformedPolicy};
pub use observe::{RoundObserver, RoundReport, TracingObserver, RecordingObserver};

// ============================================================================
// Convenience entry point
// ============================================================================

/// Run to convergence in memory with the default configuration.
///
/// Must be awaited inside a tokio runtime.
pub async fn shortest_hops(dataset: RoundDataset) -> Result<Converged> {
    Coordinator::in_memory(SearchConfig::default())
        .run_until_converged(dataset)
        .await
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("Duplicate record for node {0}")]
    DuplicateNode(NodeId),

    #[error("No adjacency payload for node {0}: its own record was lost or it is not a node")]
    MissingAdjacencyPayload(NodeId),

    #[error("Conflicting adjacency payloads for node {0}")]
    ConflictingAdjacency(NodeId),

    #[error("Round {round} failed: {message}")]
    SubstrateExecutionFailure { round: u64, message: String },

    #[error("Did not converge within {rounds} rounds")]
    DidNotConverge { rounds: u64, dataset: Box<RoundDataset> },

    #[error("Aborted after {rounds} rounds")]
    Aborted { rounds: u64 },

    #[error("Input dataset is empty")]
    EmptyDataset,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
