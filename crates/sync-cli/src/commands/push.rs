//! Push command implementation

use std::path::Path;

use colored::Colorize;
use sync_core::{CommitOutcome, CommitRequest, File};
use sync_remote::Credential;
use tracing::warn;

use crate::commands::status::compute_status;
use crate::context::Context;
use crate::error::Result;
use crate::state::SyncState;

/// Run the push command. Returns `None` when there was nothing to commit.
pub async fn run_push(
    ctx: &Context,
    dir: &Path,
    message: &str,
    token: &Credential,
) -> Result<Option<CommitOutcome>> {
    let mut state = SyncState::load(dir)?;
    let report = compute_status(dir, &state, ctx.config.max_file_bytes)?;

    if !report.deleted.is_empty() {
        warn!(count = report.deleted.len(), "deleted files are not pushed");
    }
    let files: Vec<File> = report
        .changed()
        .map(|f| File::dirty(f.path.clone(), f.content.clone()))
        .collect();
    if files.is_empty() {
        println!("{}", "Nothing to push".green());
        return Ok(None);
    }

    let author = ctx.engine.verify_identity(token).await?;
    let request = CommitRequest {
        owner: state.owner.clone(),
        repo: state.repo.clone(),
        branch: state.branch.clone(),
        base_commit_sha: state.base_commit_sha.clone(),
        files,
        message: message.to_string(),
        author,
    };

    println!(
        "{} Committing {} files to {}/{}...",
        "=>".blue().bold(),
        request.files.len(),
        state.owner.cyan(),
        state.repo.cyan()
    );
    let outcome = ctx.engine.commit_files(&request, token).await?;

    // Files dropped by the size guard keep their old checksum and stay modified
    for file in &outcome.committed {
        state.record(&file.path, &file.content);
    }
    state.base_commit_sha = outcome.commit_sha.clone();
    state.save(dir)?;

    println!(
        "{} {} as {}",
        "Pushed".green().bold(),
        outcome.committed.len(),
        outcome.commit_sha.dimmed()
    );
    Ok(Some(outcome))
}
