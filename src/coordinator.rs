//! Round coordinator: drives rounds until a fixed point.
//!
//! Rounds are strictly sequential: round *k+1* starts only after round *k*
//! has been fully materialized and compared. Round 1 is always executed,
//! even when the input is already a fixed point, because convergence is a
//! comparison between an input and a produced output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, Instrument};

use crate::config::SearchConfig;
use crate::convergence::{has_converged, RoundDelta};
use crate::model::RoundDataset;
use crate::observe::{RoundObserver, RoundReport, TracingObserver};
use crate::substrate::{MemorySubstrate, Substrate};
use crate::{merge, propagate, Error, Result};

/// Successful outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converged {
    /// Output of the last round (identical to its input).
    pub dataset: RoundDataset,
    /// Rounds executed, including the final confirming round.
    pub rounds: u64,
    /// Per-round change summary, `history[k - 1]` for round *k*.
    pub history: Vec<RoundDelta>,
}

/// Requests that a running coordinator stop at the next round boundary.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Runs propagate/merge rounds on a substrate until the output stops
/// changing.
pub struct Coordinator<S: Substrate> {
    substrate: S,
    config: SearchConfig,
    observer: Arc<dyn RoundObserver>,
    abort: AbortHandle,
}

impl<S: Substrate> Coordinator<S> {
    pub fn new(substrate: S, config: SearchConfig) -> Self {
        Self {
            substrate,
            config,
            observer: Arc::new(TracingObserver),
            abort: AbortHandle::default(),
        }
    }

    /// Replace the default tracing observer.
    pub fn with_observer(mut self, observer: Arc<dyn RoundObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Handle that stops the loop after the round in flight.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run rounds until a round's output equals its input.
    ///
    /// Fails with `DidNotConverge` (carrying the last output) when
    /// `max_rounds` is reached first, and with `Aborted` when the abort
    /// handle fires. Substrate failures are returned as-is; there is no
    /// retry at this layer.
    pub async fn run_until_converged(&self, initial: RoundDataset) -> Result<Converged> {
        self.config.validate()?;
        if initial.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let mut current = initial;
        let mut history = Vec::new();
        let mut round = 0u64;

        loop {
            if self.abort.is_aborted() {
                info!(rounds = round, "search aborted");
                return Err(Error::Aborted { rounds: round });
            }
            round += 1;

            let started = Instant::now();
            self.observer.round_started(round, current.len());
            let next = self
                .substrate
                .run_round(round, &current, propagate::propagate, merge::merge)
                .instrument(info_span!("round", round))
                .await?;

            if !current.same_keys(&next) {
                return Err(Error::SubstrateExecutionFailure {
                    round,
                    message: format!(
                        "node set changed from {} to {} keys",
                        current.len(),
                        next.len()
                    ),
                });
            }

            let delta = RoundDelta::between(&current, &next);
            let converged = has_converged(&current, &next);
            history.push(delta);
            self.observer.round_completed(&RoundReport {
                round,
                nodes: next.len(),
                delta,
                converged,
                elapsed: started.elapsed(),
            });

            if converged {
                info!(rounds = round, reached = delta.reached, "{round} rounds to compute shortest paths");
                return Ok(Converged { dataset: next, rounds: round, history });
            }
            if self.config.max_rounds.is_some_and(|max| round >= max) {
                return Err(Error::DidNotConverge { rounds: round, dataset: Box::new(next) });
            }

            current = next;
        }
    }
}

impl Coordinator<MemorySubstrate> {
    /// Coordinator over an in-process substrate sized by `config.workers`.
    pub fn in_memory(config: SearchConfig) -> Self {
        let substrate = MemorySubstrate::from_config(&config);
        Self::new(substrate, config)
    }
}
