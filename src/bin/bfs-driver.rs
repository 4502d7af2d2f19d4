use std::path::{Path, PathBuf};

use anyhow::Context;
use bfs_rs::codec;
use bfs_rs::{Coordinator, MalformedPolicy, MemorySubstrate, PersistingSubstrate, SearchConfig};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Parallel breadth-first search over a tab-separated adjacency file.
///
/// Each round's output is written to `<INPUT>-<round>`; the run stops when
/// a round's output equals its input.
#[derive(Parser)]
#[command(name = "bfs-driver")]
struct Cli {
    /// Initial dataset: one `node<TAB>(neighbors),distance` line per node.
    input: PathBuf,

    /// Give up after this many rounds.
    #[arg(long)]
    max_rounds: Option<u64>,

    /// Worker threads per round (defaults to available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// Fail on malformed input lines instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// JSON configuration file; command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn search_config(&self) -> anyhow::Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => SearchConfig::default(),
        };
        if let Some(max) = self.max_rounds {
            config = config.with_max_rounds(max);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.strict {
            config = config.with_malformed(MalformedPolicy::Reject);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let config = cli.search_config()?;

    let loaded = codec::load_file(&cli.input, config.malformed)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    if loaded.skipped > 0 || loaded.duplicates > 0 {
        warn!(skipped = loaded.skipped, duplicates = loaded.duplicates, "input records dropped");
    }
    info!(nodes = loaded.dataset.len(), reached = loaded.dataset.reached(), input = %cli.input.display(), "starting search");

    let substrate = PersistingSubstrate::new(MemorySubstrate::from_config(&config), &cli.input);
    let coordinator = Coordinator::new(substrate, config);
    let result = coordinator.run_until_converged(loaded.dataset).await?;

    let output = coordinator.substrate().path_for(result.rounds);
    info!(rounds = result.rounds, reached = result.dataset.reached(), output = %output.display(), "converged");
    println!("{}", summary(result.rounds, &output));
    Ok(())
}

/// Final stdout report, independent of the log filter.
fn summary(rounds: u64, output: &Path) -> String {
    format!("{rounds} rounds to compute shortest paths\n{}", output.display())
}
