//! Round observers: an injected diagnostic sink.
//!
//! The coordinator reports to whatever observer it was given; nothing here
//! is process-global. Observers never influence the outcome of a run.

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::convergence::RoundDelta;

/// Summary of one finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: u64,
    pub nodes: usize,
    pub delta: RoundDelta,
    pub converged: bool,
    pub elapsed: Duration,
}

/// Receives progress callbacks from the coordinator.
///
/// Both hooks default to doing nothing.
pub trait RoundObserver: Send + Sync {
    fn round_started(&self, _round: u64, _nodes: usize) {}

    fn round_completed(&self, _report: &RoundReport) {}
}

/// Forwards round progress to `tracing`. The coordinator's default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RoundObserver for TracingObserver {
    fn round_completed(&self, report: &RoundReport) {
        info!(
            round = report.round,
            nodes = report.nodes,
            changed = report.delta.distance_changes,
            newly_reached = report.delta.newly_reached,
            reached = report.delta.reached,
            converged = report.converged,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "round complete"
        );
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    reports: Mutex<Vec<RoundReport>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<RoundReport> {
        self.reports.lock().clone()
    }

    pub fn rounds(&self) -> usize {
        self.reports.lock().len()
    }
}

impl RoundObserver for RecordingObserver {
    fn round_completed(&self, report: &RoundReport) {
        self.reports.lock().push(report.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        for round in 1..=3 {
            observer.round_completed(&RoundReport {
                round,
                nodes: 10,
                delta: RoundDelta::default(),
                converged: round == 3,
                elapsed: Duration::from_millis(1),
            });
        }
        let rounds: Vec<u64> = observer.reports().iter().map(|r| r.round).collect();
        assert_eq!(rounds, vec![1, 2, 3]);
        assert_eq!(observer.rounds(), 3);
    }
}
