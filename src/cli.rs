use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the inventory agent.
///
/// Flags mirror the configuration surface; anything given here overrides
/// the value loaded from the YAML config file.
#[derive(Parser, Debug)]
#[clap(name = "inventory-agent", about = "Scheduled device inventory collector")]
pub struct Args {
    /// Base URL of the collection endpoint
    #[clap(long)]
    pub base_url: Option<String>,

    /// Subject/user identifier attached to every delivery
    #[clap(long)]
    pub user_id: Option<String>,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Run a single collection cycle and exit
    #[clap(long)]
    pub once: bool,

    /// Override the interval between collection cycles (seconds)
    #[clap(long)]
    pub interval_secs: Option<u64>,

    /// Override the number of uploads allowed in flight simultaneously
    #[clap(long)]
    pub max_concurrent_uploads: Option<usize>,

    /// Add a directory to scan for media files (repeatable)
    #[clap(long)]
    pub media_root: Vec<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the agent.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = "agent.yaml")]
        path: PathBuf,
    },
}
