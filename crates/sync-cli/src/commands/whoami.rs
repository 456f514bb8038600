//! Whoami command implementation

use colored::Colorize;
use sync_remote::Credential;

use crate::context::Context;
use crate::error::Result;

/// Print the author new commits will carry.
pub async fn run_whoami(ctx: &Context, token: &Credential) -> Result<()> {
    let author = ctx.engine.verify_identity(token).await?;
    println!("{} <{}>", author.name.bold(), author.email.cyan());
    Ok(())
}
