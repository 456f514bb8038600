//! Project Sync CLI
//!
//! Pull a hosted repository into a directory, inspect local changes and
//! push them back as a single commit.

mod cli;
mod commands;
mod context;
mod error;
mod logging;
mod state;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::{Context, require_token};
use error::{CliError, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        if let Some(wait) = e.retry_after() {
            eprintln!("{}: retry in {}s", "hint".yellow(), wait.as_secs().max(1));
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        return Err(CliError::user(format!("Failed to initialise logging: {e}")));
    }
    tracing::debug!("Verbose mode enabled");

    let ctx = Context::load(cli.config.as_deref())?;
    execute_command(&ctx, cli.command).await
}

async fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Pull {
            repository,
            dir,
            force,
            auth,
        } => {
            let token = require_token(&auth)?;
            commands::run_pull(ctx, &repository, dir.as_deref(), force, &token).await?;
            Ok(())
        }
        Commands::Status { dir } => commands::run_status(&dir, ctx.config.max_file_bytes),
        Commands::Push { dir, message, auth } => {
            let token = require_token(&auth)?;
            commands::run_push(ctx, &dir, &message, &token).await?;
            Ok(())
        }
        Commands::Whoami { auth } => {
            let token = require_token(&auth)?;
            commands::run_whoami(ctx, &token).await
        }
    }
}
