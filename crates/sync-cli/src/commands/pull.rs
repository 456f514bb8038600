//! Pull command implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use colored::Colorize;
use sync_fs::{LocalDirectoryAdapter, LocalRoot, RepoFilePath};
use sync_remote::Credential;
use tracing::{info, warn};

use crate::commands::status::compute_status;
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::state::SyncState;

/// Split `owner/name`.
pub fn parse_repository(raw: &str) -> Result<(&str, &str)> {
    match raw.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(CliError::user(format!(
            "Invalid repository '{raw}', expected owner/name"
        ))),
    }
}

/// Run the pull command
///
/// Nothing on disk changes unless every file of the head commit was fetched.
/// Files tracked by an earlier pull that no longer exist upstream are
/// removed, unless they were edited locally.
pub async fn run_pull(
    ctx: &Context,
    repository: &str,
    dir: Option<&Path>,
    force: bool,
    token: &Credential,
) -> Result<PathBuf> {
    let (owner, repo) = parse_repository(repository)?;
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(repo));

    if !force {
        guard_local_changes(&dir, ctx.config.max_file_bytes)?;
    }
    let previous = if SyncState::exists(&dir) {
        Some(SyncState::load(&dir)?)
    } else {
        None
    };

    println!("{} Importing {}/{}...", "=>".blue().bold(), owner.cyan(), repo.cyan());
    let imported = ctx
        .engine
        .import_repository(owner, repo, token)
        .await?
        .ensure_complete()?;

    std::fs::create_dir_all(&dir)?;
    let root = LocalRoot::open(dir.as_path())?;
    let adapter = LocalDirectoryAdapter::new(ctx.config.max_file_bytes);

    let mut state = SyncState {
        owner: imported.owner.clone(),
        repo: imported.repo.clone(),
        branch: imported.branch.clone(),
        base_commit_sha: imported.latest_commit_sha.clone(),
        files: BTreeMap::new(),
    };
    for file in &imported.files {
        adapter.write_file(&root, &file.path, &file.content)?;
        state.record(&file.path, &file.content);
    }
    if let Some(previous) = &previous {
        remove_stale(&adapter, &root, previous, &state)?;
    }
    state.save(&dir)?;

    println!(
        "{} {} files from {} at {}",
        "Pulled".green().bold(),
        imported.files.len(),
        imported.branch.bold(),
        imported.latest_commit_sha.dimmed()
    );
    Ok(dir)
}

/// Delete files the previous pull tracked that the new head no longer has.
fn remove_stale(
    adapter: &LocalDirectoryAdapter,
    root: &LocalRoot,
    previous: &SyncState,
    current: &SyncState,
) -> Result<()> {
    let stale = previous
        .files
        .keys()
        .filter(|path| !current.files.contains_key(*path))
        .filter_map(|path| RepoFilePath::parse(path).ok());

    for path in stale {
        match adapter.read_file(root, &path)? {
            Some(content) if previous.matches(&path, &content) => {
                adapter.remove_file(root, &path)?;
                info!(path = %path, "removed file deleted upstream");
            }
            Some(_) => warn!(path = %path, "file was deleted upstream but has local edits, keeping it"),
            None => {}
        }
    }
    Ok(())
}

/// Refuse to overwrite unpushed work or an unrelated non-empty directory.
fn guard_local_changes(dir: &Path, max_file_bytes: u64) -> Result<()> {
    if SyncState::exists(dir) {
        let state = SyncState::load(dir)?;
        let report = compute_status(dir, &state, max_file_bytes)?;
        if !report.is_clean() {
            return Err(CliError::user(format!(
                "{} has local changes; push them first or pass --force",
                dir.display()
            )));
        }
    } else if dir.is_dir() && std::fs::read_dir(dir)?.next().is_some() {
        return Err(CliError::user(format!(
            "{} is not empty; pass --force to pull into it anyway",
            dir.display()
        )));
    }
    Ok(())
}
