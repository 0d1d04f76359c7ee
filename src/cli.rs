//! Command line interface and logging setup.

use std::sync::Arc;

use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::table::{CasScoreTable, MutexScoreTable, ScoreTable};

/// Command line arguments for the highscores server.
#[derive(Debug, Parser)]
#[command(name = "highscores", about = "HTTP highscores table", version)]
pub struct Cli {
    /// TCP port for the HTTP API.
    #[arg(short, long, env = "HIGHSCORES_PORT", default_value_t = 7002)]
    pub port: u16,

    /// Concurrency discipline guarding the shared ranking state.
    #[arg(long, value_enum, default_value = "mutex")]
    pub table: TableKind,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Selects one of the two [`ScoreTable`] cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TableKind {
    /// Snapshot reference guarded by a mutex.
    Mutex,
    /// Snapshot reference updated by a compare-and-swap loop.
    Cas,
}

impl TableKind {
    /// Instantiates an empty table of the chosen kind.
    pub fn build(self) -> Arc<dyn ScoreTable> {
        match self {
            TableKind::Mutex => Arc::new(MutexScoreTable::new()),
            TableKind::Cas => Arc::new(CasScoreTable::new()),
        }
    }
}

/// Initializes the global tracing subscriber.
///
/// `--quiet` wins over everything; otherwise `RUST_LOG` is respected when
/// set, and the verbosity flags pick the default level when it is not.
pub fn init_logging(cli: &Cli) {
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else {
        let base_level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
