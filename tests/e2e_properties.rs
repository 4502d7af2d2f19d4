//! Property tests over randomly generated graphs.
//!
//! Graphs are `n` nodes named `n0..n{n-1}` with random out-edges and a
//! random seed set. Rounds are driven one at a time through the in-memory
//! substrate so every intermediate dataset can be checked.

use std::collections::VecDeque;

use bfs_rs::{
    Distance, EmittedValue, MemorySubstrate, NodeId, NodeRecord, RoundDataset, Substrate,
};
use proptest::prelude::*;

// ============================================================================
// Generators and a sequential reference
// ============================================================================

#[derive(Debug, Clone)]
struct Graph {
    adjacency: Vec<Vec<usize>>,
    seeds: Vec<bool>,
}

fn name(i: usize) -> NodeId {
    NodeId::new(format!("n{i}"))
}

fn graph_strategy() -> impl Strategy<Value = Graph> {
    (1usize..24).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(0..n, 0..4), n),
            prop::collection::vec(prop::bool::weighted(0.15), n),
        )
            .prop_map(|(adjacency, seeds)| Graph { adjacency, seeds })
    })
}

impl Graph {
    fn dataset(&self) -> RoundDataset {
        self.adjacency
            .iter()
            .enumerate()
            .map(|(i, out)| {
                let distance = if self.seeds[i] { Distance::ZERO } else { Distance::Unknown };
                (name(i), NodeRecord::new(out.iter().copied().map(name).collect(), distance))
            })
            .collect()
    }

    /// Queue-based multi-source BFS.
    fn reference(&self) -> Vec<Distance> {
        let mut dist = vec![Distance::Unknown; self.adjacency.len()];
        let mut queue = VecDeque::new();
        for (i, seed) in self.seeds.iter().enumerate() {
            if *seed {
                dist[i] = Distance::ZERO;
                queue.push_back(i);
            }
        }
        while let Some(v) = queue.pop_front() {
            let next = dist[v].relax();
            for &w in &self.adjacency[v] {
                if dist[w] == Distance::Unknown {
                    dist[w] = next;
                    queue.push_back(w);
                }
            }
        }
        dist
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

/// Every dataset from the input up to and including the first repeat.
fn run_rounds(ds: RoundDataset, workers: usize) -> Vec<RoundDataset> {
    let substrate = MemorySubstrate::with_workers(workers);
    let rt = runtime();
    let mut rounds = vec![ds];
    for round in 1.. {
        let current = rounds.last().unwrap();
        let next = rt
            .block_on(substrate.run_round(round, current, bfs_rs::propagate, bfs_rs::merge))
            .unwrap();
        let done = bfs_rs::has_converged(current, &next);
        rounds.push(next);
        if done {
            break;
        }
    }
    rounds
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn distances_never_increase(graph in graph_strategy(), workers in 1usize..5) {
        let rounds = run_rounds(graph.dataset(), workers);
        for pair in rounds.windows(2) {
            for (id, after) in pair[1].iter() {
                let before = pair[0].distance(id.as_str()).unwrap();
                prop_assert!(
                    after.distance == before || after.distance.improves_on(before),
                    "{id}: {before} -> {}", after.distance
                );
            }
        }
    }

    #[test]
    fn node_set_is_closed(graph in graph_strategy()) {
        let rounds = run_rounds(graph.dataset(), 3);
        for pair in rounds.windows(2) {
            prop_assert!(pair[0].same_keys(&pair[1]));
        }
    }

    #[test]
    fn topology_is_preserved(graph in graph_strategy()) {
        let input = graph.dataset();
        let last = run_rounds(input.clone(), 2).pop().unwrap();
        for (id, record) in input.iter() {
            prop_assert_eq!(&last.get(id.as_str()).unwrap().adjacency, &record.adjacency);
        }
    }

    #[test]
    fn converged_dataset_is_a_fixed_point(graph in graph_strategy()) {
        let converged = run_rounds(graph.dataset(), 2).pop().unwrap();
        let again = runtime()
            .block_on(MemorySubstrate::with_workers(4).run_round(1, &converged, bfs_rs::propagate, bfs_rs::merge))
            .unwrap();
        prop_assert_eq!(again, converged);
    }

    #[test]
    fn converged_distances_match_sequential_bfs(graph in graph_strategy(), workers in 1usize..5) {
        let converged = run_rounds(graph.dataset(), workers).pop().unwrap();
        for (i, expected) in graph.reference().into_iter().enumerate() {
            prop_assert_eq!(converged.distance(name(i).as_str()), Some(expected), "node n{}", i);
        }
    }

    #[test]
    fn coordinator_agrees_with_round_by_round(graph in graph_strategy()) {
        let rounds = run_rounds(graph.dataset(), 2);
        let result = runtime().block_on(bfs_rs::shortest_hops(graph.dataset())).unwrap();
        prop_assert_eq!(result.rounds as usize, rounds.len() - 1);
        prop_assert_eq!(&result.dataset, rounds.last().unwrap());
    }

    #[test]
    fn merge_ignores_arrival_order(
        (values, shuffled) in (
            prop::collection::vec(-1i64..20, 0..12),
            prop::collection::vec("[a-e]", 0..4),
        )
            .prop_flat_map(|(raw, neighbors)| {
                let mut values: Vec<EmittedValue> = raw
                    .into_iter()
                    .map(|d| EmittedValue::Candidate(Distance::from_raw(d).unwrap()))
                    .collect();
                values.push(EmittedValue::Adjacency(neighbors.into_iter().map(NodeId::from).collect()));
                (Just(values.clone()), Just(values).prop_shuffle())
            })
    ) {
        let id = NodeId::from("k");
        prop_assert_eq!(bfs_rs::merge(&id, &values).unwrap(), bfs_rs::merge(&id, &shuffled).unwrap());
    }
}
