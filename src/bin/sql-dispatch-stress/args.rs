use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use sql_dispatch::DispatchOptions;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hammer one sql-dispatch connection from many producer threads")]
pub(crate) struct Args {
    /// SQLite database file; recreated on every run.
    #[arg(long, default_value = "sql-dispatch-stress.db")]
    pub(crate) db: PathBuf,
    #[arg(long, default_value_t = 8)]
    pub(crate) producers: usize,
    /// Statements queued by each producer.
    #[arg(long, default_value_t = 1_000)]
    pub(crate) statements: usize,
    /// Wrap every N statements of a producer in a batch (0 disables batching).
    #[arg(long, default_value_t = 0)]
    pub(crate) batch_every: usize,
    /// Callback queries submitted by each producer.
    #[arg(long, default_value_t = 4)]
    pub(crate) callbacks: usize,
    /// JSON file with dispatch options.
    #[arg(long)]
    pub(crate) options: Option<PathBuf>,
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub(crate) timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StressConfig {
    pub(crate) db: PathBuf,
    pub(crate) producers: usize,
    pub(crate) statements: usize,
    pub(crate) batch_every: usize,
    pub(crate) callbacks: usize,
    pub(crate) log: Option<PathBuf>,
    pub(crate) timeout_ms: u64,
    pub(crate) dispatch: DispatchOptions,
}

impl StressConfig {
    pub(crate) fn from_args(args: Args) -> Result<Self, String> {
        let dispatch = match &args.options {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                serde_json::from_str(&text)
                    .map_err(|e| format!("bad dispatch options in {}: {e}", path.display()))?
            }
            None => DispatchOptions::default(),
        };

        Ok(StressConfig {
            db: args.db,
            producers: args.producers.max(1),
            statements: args.statements,
            batch_every: args.batch_every,
            callbacks: args.callbacks,
            log: args.log,
            timeout_ms: u64::try_from(args.timeout.as_millis()).unwrap_or(u64::MAX),
            dispatch,
        })
    }

    pub(crate) fn expected_updates(&self) -> usize {
        self.producers * self.statements
    }

    pub(crate) fn expected_callbacks(&self) -> usize {
        self.producers * self.callbacks
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
