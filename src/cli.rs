use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Task manager with dashboards, per-person views and HTML reports.
/// State lives in ~/.taskpro by default, or in a remote blob store with --remote.
#[derive(Parser)]
#[command(name = "taskpro", version, about = "Office task management CLI")]
pub struct Cli {
    /// Directory holding taskpro.toml and the local store.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Load from and save to the remote blob store instead of the data directory.
    #[arg(long, global = true)]
    pub remote: bool,

    #[command(subcommand)]
    pub command: Commands,
}
