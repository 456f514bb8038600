//! Status command implementation

use std::collections::BTreeSet;
use std::path::Path;

use colored::Colorize;
use sync_fs::{ExtensionClassifier, LocalDirectoryAdapter, LocalFile, LocalRoot};

use crate::error::Result;
use crate::state::SyncState;

/// Local changes relative to the last synced state.
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub modified: Vec<LocalFile>,
    pub added: Vec<LocalFile>,
    /// Tracked paths no longer present locally
    pub deleted: Vec<String>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty() && self.deleted.is_empty()
    }

    /// Files whose current content would be committed.
    pub fn changed(&self) -> impl Iterator<Item = &LocalFile> {
        self.modified.iter().chain(self.added.iter())
    }
}

/// Compare the text files under `dir` with `state`.
pub fn compute_status(dir: &Path, state: &SyncState, max_file_bytes: u64) -> Result<StatusReport> {
    let root = LocalRoot::open(dir)?;
    let files = LocalDirectoryAdapter::new(max_file_bytes).read_tree(&root, &ExtensionClassifier::new())?;

    let mut report = StatusReport::default();
    let mut seen = BTreeSet::new();
    for file in files {
        seen.insert(file.path.as_str().to_string());
        if !state.files.contains_key(file.path.as_str()) {
            report.added.push(file);
        } else if !state.matches(&file.path, &file.content) {
            report.modified.push(file);
        }
    }
    report.deleted = state
        .files
        .keys()
        .filter(|path| !seen.contains(*path))
        .cloned()
        .collect();

    Ok(report)
}

/// Run the status command
pub fn run_status(dir: &Path, max_file_bytes: u64) -> Result<()> {
    let state = SyncState::load(dir)?;
    let report = compute_status(dir, &state, max_file_bytes)?;

    println!(
        "{}/{} on {} at {}",
        state.owner.cyan(),
        state.repo.cyan(),
        state.branch.bold(),
        state.base_commit_sha.dimmed()
    );
    println!();

    if report.is_clean() {
        println!("{}", "Nothing to push, working directory matches the last sync".green());
        return Ok(());
    }

    for file in &report.modified {
        println!("  {} {}", "modified:".yellow(), file.path);
    }
    for file in &report.added {
        println!("  {} {}", "added:   ".green(), file.path);
    }
    for path in &report.deleted {
        println!("  {} {}", "deleted: ".red(), path);
    }
    Ok(())
}
