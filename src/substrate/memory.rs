//! In-memory substrate.
//!
//! This is the reference implementation of `Substrate`. A round runs off the
//! async executor, on a blocking thread that drives a dedicated rayon pool
//! through three phases:
//!
//! 1. **Map**: the dataset is split into contiguous chunks, one per
//!    worker. Each worker runs `propagate` over its chunk and buckets the
//!    emissions by a per-round hash of the target key.
//! 2. **Shuffle**: once every map task has finished (the barrier),
//!    bucket *p* of every chunk is concatenated into partition *p*.
//! 3. **Merge**: each partition is grouped by key and merged as its own
//!    pool task.
//!
//! Workers share no mutable state; the only hand-off is the bucket vectors
//! returned from the map tasks.
//!
//! ## Limitations
//!
//! - **No retries**: a panicking worker fails the whole round.
//! - **Single process**: the whole dataset and all emissions of a round
//!   are held in memory at once, plus one snapshot of the input.
//! - **Tokio required**: `run_round` must be awaited inside a tokio runtime.

use std::hash::BuildHasher;
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::{DefaultHashBuilder, HashMap};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use smallvec::SmallVec;
use tracing::debug;

use crate::config::SearchConfig;
use crate::model::*;
use crate::{Error, Result};
use super::{MergeFn, PropagateFn, Substrate, SubstrateCapabilities};

// ============================================================================
// MemorySubstrate
// ============================================================================

/// Partitioned, multi-threaded, in-process round execution.
///
/// The worker pool is built on the first round and reused afterwards.
#[derive(Debug)]
pub struct MemorySubstrate {
    workers: usize,
    pool: Mutex<Option<Arc<ThreadPool>>>,
}

impl MemorySubstrate {
    /// One worker per available CPU.
    pub fn new() -> Self {
        Self::from_config(&SearchConfig::default())
    }

    pub fn with_workers(workers: usize) -> Self {
        Self { workers: workers.max(1), pool: Mutex::new(None) }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::with_workers(config.effective_workers())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn pool(&self, round: u64) -> Result<Arc<ThreadPool>> {
        let mut slot = self.pool.lock();
        if let Some(pool) = slot.as_ref() {
            return Ok(Arc::clone(pool));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("bfs-worker-{i}"))
            .build()
            .map_err(|e| Error::SubstrateExecutionFailure {
                round,
                message: format!("cannot start {} workers: {e}", self.workers),
            })?;
        debug!(workers = self.workers, "worker pool started");
        Ok(Arc::clone(slot.insert(Arc::new(pool))))
    }
}

impl Default for MemorySubstrate {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Phase helpers
// ============================================================================

fn execute(
    pool: &ThreadPool,
    round: u64,
    dataset: &RoundDataset,
    propagate: PropagateFn,
    merge: MergeFn,
) -> Result<RoundDataset> {
    let entries: Vec<(&NodeId, &NodeRecord)> = dataset.iter().collect();
    let partitions = pool.current_num_threads().min(entries.len()).max(1);
    let chunk_len = entries.len().div_ceil(partitions).max(1);
    let hasher = DefaultHashBuilder::default();

    // ---- Map ----
    let mapped: Vec<Vec<Vec<Emission>>> = pool.install(|| {
        entries
            .par_chunks(chunk_len)
            .map(|chunk| map_chunk(chunk, propagate, &hasher, partitions))
            .collect()
    });

    // ---- Shuffle (barrier: every map task has returned) ----
    let mut shuffled: Vec<Vec<Emission>> = vec![Vec::new(); partitions];
    for buckets in mapped {
        for (p, bucket) in buckets.into_iter().enumerate() {
            shuffled[p].extend(bucket);
        }
    }
    debug!(
        round,
        partitions,
        emissions = shuffled.iter().map(Vec::len).sum::<usize>(),
        "map phase complete"
    );

    // ---- Merge ----
    let merged: Vec<PartitionOutput> = pool.install(|| {
        shuffled
            .into_par_iter()
            .map(|emissions| merge_partition(emissions, merge))
            .collect()
    });

    let mut output = RoundDataset::new();
    let mut first_error: Option<(NodeId, Error)> = None;
    for part in merged {
        output.extend(part.records);
        for (id, err) in part.errors {
            if first_error.as_ref().is_none_or(|(seen, _)| id < *seen) {
                first_error = Some((id, err));
            }
        }
    }
    if let Some((_, err)) = first_error {
        return Err(err);
    }

    debug!(round, nodes = output.len(), "merge phase complete");
    Ok(output)
}

struct PartitionOutput {
    records: Vec<(NodeId, NodeRecord)>,
    errors: Vec<(NodeId, Error)>,
}

fn partition_of(hasher: &DefaultHashBuilder, key: &NodeId, partitions: usize) -> usize {
    (hasher.hash_one(key) % partitions as u64) as usize
}

fn map_chunk(
    chunk: &[(&NodeId, &NodeRecord)],
    propagate: PropagateFn,
    hasher: &DefaultHashBuilder,
    partitions: usize,
) -> Vec<Vec<Emission>> {
    let mut buckets: Vec<Vec<Emission>> = vec![Vec::new(); partitions];
    for &(id, record) in chunk {
        for emission in propagate(id, record) {
            let p = partition_of(hasher, &emission.key, partitions);
            buckets[p].push(emission);
        }
    }
    buckets
}

fn merge_partition(emissions: Vec<Emission>, merge: MergeFn) -> PartitionOutput {
    let mut groups: HashMap<NodeId, SmallVec<[EmittedValue; 4]>> = HashMap::new();
    for Emission { key, value } in emissions {
        groups.entry(key).or_default().push(value);
    }

    let mut out = PartitionOutput { records: Vec::with_capacity(groups.len()), errors: Vec::new() };
    for (id, values) in groups {
        match merge(&id, &values) {
            Ok(record) => out.records.push((id, record)),
            Err(err) => out.errors.push((id, err)),
        }
    }
    out
}

// ============================================================================
// Substrate impl
// ============================================================================

#[async_trait]
impl Substrate for MemorySubstrate {
    async fn run_round(
        &self,
        round: u64,
        dataset: &RoundDataset,
        propagate: PropagateFn,
        merge: MergeFn,
    ) -> Result<RoundDataset> {
        let pool = self.pool(round)?;
        let snapshot = dataset.clone();

        // A panic anywhere in the pool resurfaces here as a JoinError.
        tokio::task::spawn_blocking(move || execute(&pool, round, &snapshot, propagate, merge))
            .await
            .map_err(|e| Error::SubstrateExecutionFailure {
                round,
                message: format!("round worker failed: {e}"),
            })?
    }

    fn capabilities(&self) -> SubstrateCapabilities {
        SubstrateCapabilities { parallelism: self.workers, persists_rounds: false }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{merge::merge, propagate::propagate};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    fn chain() -> RoundDataset {
        RoundDataset::seeded([("A", vec!["B"]), ("B", vec!["C"]), ("C", vec![])], &["A"])
    }

    #[tokio::test]
    async fn test_one_round_relaxes_one_hop() {
        let substrate = MemorySubstrate::with_workers(2);
        let next = substrate.run_round(1, &chain(), propagate, merge).await.unwrap();

        assert_eq!(next.distance("A"), Some(Distance::ZERO));
        assert_eq!(next.distance("B"), Some(Distance::Hops(1)));
        assert_eq!(next.distance("C"), Some(Distance::Unknown));
        assert_eq!(next.get("B").unwrap().adjacency, vec![NodeId::from("C")]);
    }

    #[tokio::test]
    async fn test_worker_count_does_not_change_output() {
        let ds: RoundDataset = (0..50)
            .map(|i| {
                let id = NodeId::new(format!("n{i}"));
                let adjacency = vec![NodeId::new(format!("n{}", (i * 7 + 3) % 50)), NodeId::new(format!("n{}", (i + 1) % 50))];
                let distance = if i == 0 { Distance::ZERO } else { Distance::Unknown };
                (id, NodeRecord::new(adjacency, distance))
            })
            .collect();

        let single = MemorySubstrate::with_workers(1).run_round(1, &ds, propagate, merge).await.unwrap();
        for workers in [2, 3, 8, 64] {
            let many = MemorySubstrate::with_workers(workers).run_round(1, &ds, propagate, merge).await.unwrap();
            assert_eq!(many, single, "workers = {workers}");
        }
    }

    #[tokio::test]
    async fn test_dangling_neighbor_fails_round() {
        let ds = RoundDataset::seeded([("A", vec!["B", "Ghost"]), ("B", vec![])], &["A"]);
        let err = MemorySubstrate::with_workers(2).run_round(1, &ds, propagate, merge).await.unwrap_err();
        assert!(matches!(err, Error::MissingAdjacencyPayload(ref id) if id.as_str() == "Ghost"));
    }

    #[tokio::test]
    async fn test_smallest_failing_key_is_reported() {
        let ds = RoundDataset::seeded([("A", vec!["Zed", "Mid", "Bee"])], &["A"]);
        for workers in [1, 4] {
            let err = MemorySubstrate::with_workers(workers).run_round(1, &ds, propagate, merge).await.unwrap_err();
            assert!(matches!(err, Error::MissingAdjacencyPayload(ref id) if id.as_str() == "Bee"));
        }
    }

    fn exploding(_: &NodeId, _: &NodeRecord) -> Emissions {
        panic!("worker lost")
    }

    #[tokio::test]
    async fn test_worker_panic_is_substrate_failure() {
        let err = MemorySubstrate::with_workers(3).run_round(7, &chain(), exploding, merge).await.unwrap_err();
        match err {
            Error::SubstrateExecutionFailure { round, message } => {
                assert_eq!(round, 7);
                assert!(message.contains("panicked"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pool_survives_a_failed_round() {
        let substrate = MemorySubstrate::with_workers(2);
        assert!(substrate.run_round(1, &chain(), exploding, merge).await.is_err());
        let next = substrate.run_round(2, &chain(), propagate, merge).await.unwrap();
        assert_eq!(next.distance("B"), Some(Distance::Hops(1)));
    }

    static EXECUTOR_RAN: AtomicBool = AtomicBool::new(false);

    /// Blocks the map step until a task on the caller's runtime has run.
    fn waits_for_executor(id: &NodeId, record: &NodeRecord) -> Emissions {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !EXECUTOR_RAN.load(Ordering::SeqCst) {
            assert!(Instant::now() < deadline, "executor stalled during round");
            std::thread::sleep(Duration::from_millis(1));
        }
        propagate(id, record)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_round_does_not_block_the_executor() {
        let flag = tokio::spawn(async { EXECUTOR_RAN.store(true, Ordering::SeqCst) });

        let next = MemorySubstrate::with_workers(2)
            .run_round(1, &chain(), waits_for_executor, merge)
            .await
            .unwrap();

        flag.await.unwrap();
        assert_eq!(next.distance("B"), Some(Distance::Hops(1)));
    }

    #[test]
    fn test_capabilities() {
        let caps = MemorySubstrate::with_workers(4).capabilities();
        assert_eq!(caps.parallelism, 4);
        assert!(!caps.persists_rounds);
        assert_eq!(MemorySubstrate::with_workers(0).workers(), 1);
    }
}
