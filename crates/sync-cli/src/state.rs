//! Per-directory sync state in `.project-sync/state.toml`

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sync_fs::{ConfigStore, NormalizedPath, RepoFilePath, compute_content_checksum};

use crate::error::{CliError, Result};

pub const STATE_DIR: &str = ".project-sync";
pub const STATE_FILE: &str = "state.toml";

/// What a synced directory was last pulled from or pushed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Commit the directory content descends from
    pub base_commit_sha: String,
    /// Repo-relative path -> `sha256:` checksum of the last synced content
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl SyncState {
    pub fn path(dir: &Path) -> NormalizedPath {
        NormalizedPath::new(dir.join(STATE_DIR).join(STATE_FILE))
    }

    pub fn exists(dir: &Path) -> bool {
        Self::path(dir).exists()
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        if !path.exists() {
            return Err(CliError::user(format!(
                "{} is not a synced directory (run `psync pull` first)",
                dir.display()
            )));
        }
        Ok(ConfigStore::new().load(&path)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        Ok(ConfigStore::new().save(&Self::path(dir), self)?)
    }

    /// Record `content` as the synced state of `path`.
    pub fn record(&mut self, path: &RepoFilePath, content: &str) {
        self.files
            .insert(path.as_str().to_string(), compute_content_checksum(content));
    }

    /// Whether `content` matches the last synced state of `path`.
    pub fn matches(&self, path: &RepoFilePath, content: &str) -> bool {
        self.files
            .get(path.as_str())
            .is_some_and(|checksum| *checksum == compute_content_checksum(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn state() -> SyncState {
        SyncState {
            owner: "acme".into(),
            repo: "site".into(),
            branch: "main".into(),
            base_commit_sha: "abc123".into(),
            files: BTreeMap::new(),
        }
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let mut original = state();
        original.record(&RepoFilePath::parse("src/app.js").unwrap(), "run()");

        original.save(temp.path()).unwrap();
        assert!(temp.path().join(".project-sync/state.toml").exists());
        assert_eq!(SyncState::load(temp.path()).unwrap(), original);
    }

    #[test]
    fn missing_state_is_user_error() {
        let temp = TempDir::new().unwrap();
        let err = SyncState::load(temp.path()).unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
    }

    #[test]
    fn matches_tracks_content() {
        let path = RepoFilePath::parse("a.txt").unwrap();
        let mut s = state();
        assert!(!s.matches(&path, "a"));
        s.record(&path, "a");
        assert!(s.matches(&path, "a"));
        assert!(!s.matches(&path, "b"));
    }
}
