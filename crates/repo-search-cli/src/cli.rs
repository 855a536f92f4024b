//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::repo::RepoCommand;
use crate::commands::search::SearchArgs;

/// Search an AT Protocol repo directory.
#[derive(Parser, Debug)]
#[command(name = "repo-search")]
#[command(author, version = env!("REPO_SEARCH_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search repos by handle, display name, email or DID
    Search(SearchArgs),

    /// Manage a local (file://) directory
    Repo(RepoCommand),
}
