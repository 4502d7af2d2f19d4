//! Persisting substrate: writes every round's output next to the input.
//!
//! ```text
//! graph.txt   →   graph.txt-1   →   graph.txt-2   →   ...
//! ```
//!
//! Round execution is delegated unchanged; the output is written with the
//! line codec after the inner substrate succeeds. A write failure fails the
//! round.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::codec;
use crate::model::*;
use crate::Result;
use super::{MergeFn, PropagateFn, Substrate, SubstrateCapabilities};

/// Decorator that saves each round to `<base>-<round>`.
pub struct PersistingSubstrate<S: Substrate> {
    inner: S,
    base: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl<S: Substrate> PersistingSubstrate<S> {
    pub fn new(inner: S, base: impl Into<PathBuf>) -> Self {
        Self { inner, base: base.into(), written: Mutex::new(Vec::new()) }
    }

    /// Where round `round` is (or will be) written.
    pub fn path_for(&self, round: u64) -> PathBuf {
        round_path(&self.base, round)
    }

    /// Every file written so far, in round order.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written.lock().clone()
    }
}

/// `<base>-<round>`, keeping non-UTF-8 bases intact.
pub fn round_path(base: &Path, round: u64) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("-{round}"));
    PathBuf::from(name)
}

#[async_trait]
impl<S: Substrate> Substrate for PersistingSubstrate<S> {
    async fn run_round(
        &self,
        round: u64,
        dataset: &RoundDataset,
        propagate: PropagateFn,
        merge: MergeFn,
    ) -> Result<RoundDataset> {
        let output = self.inner.run_round(round, dataset, propagate, merge).await?;

        let path = self.path_for(round);
        codec::save_file(&output, &path)?;
        debug!(round, path = %path.display(), "round output written");
        self.written.lock().push(path);

        Ok(output)
    }

    fn capabilities(&self) -> SubstrateCapabilities {
        SubstrateCapabilities { persists_rounds: true, ..self.inner.capabilities() }
    }
}
