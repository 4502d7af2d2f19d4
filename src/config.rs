//! Search configuration.

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What to do with an input line that does not parse as a node record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Drop the line, log it, keep going.
    #[default]
    Skip,
    /// Fail the load on the first bad line.
    Reject,
}

/// Knobs for a run. Every field has a usable default.
///
/// ```json
/// { "max_rounds": 50, "workers": 4, "malformed": "reject" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Stop with `DidNotConverge` after this many rounds.
    pub max_rounds: Option<u64>,
    /// Map/merge parallelism of the in-memory substrate.
    pub workers: Option<usize>,
    pub malformed: MalformedPolicy,
}

impl SearchConfig {
    pub fn with_max_rounds(mut self, rounds: u64) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.malformed = policy;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == Some(0) {
            return Err(Error::ConfigError("max_rounds must be at least 1".into()));
        }
        if self.workers == Some(0) {
            return Err(Error::ConfigError("workers must be at least 1".into()));
        }
        Ok(())
    }

    /// Configured worker count, or the machine's available parallelism.
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
            .max(1)
    }
}
