//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Project Sync - keep a local directory in step with a hosted Git repository
#[derive(Parser, Debug)]
#[command(name = "psync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Hosting API credential, read from the environment by default.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TokenArgs {
    /// Personal access token with `repo` scope
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Import a repository's default branch into a directory
    ///
    /// Examples:
    ///   psync pull acme/site            # Into ./site
    ///   psync pull acme/site ./work     # Into ./work
    Pull {
        /// Repository as owner/name
        repository: String,

        /// Target directory (defaults to the repository name)
        dir: Option<PathBuf>,

        /// Overwrite local changes in an already synced directory
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        auth: TokenArgs,
    },

    /// List files changed since the last pull or push
    Status {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Commit changed files on top of the last pulled or pushed commit
    Push {
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Commit message
        #[arg(short, long)]
        message: String,

        #[command(flatten)]
        auth: TokenArgs,
    },

    /// Show the commit identity for the current token
    Whoami {
        #[command(flatten)]
        auth: TokenArgs,
    },
}
