use futures_util::future::join_all;
use sync_fs::RepoFilePath;
use sync_remote::Credential;
use sync_remote::api::TreeEntry;
use sync_remote::encoding::decode_blob_content;
use tracing::{info, warn};

use super::{GitSyncEngine, require_non_empty, require_token};
use crate::{Result, SyncError};
use crate::classify::classify;
use crate::store::{File, RemoteSource};

const CONTEXT: &str = "import";

/// Branch used when the repository metadata names none.
const FALLBACK_BRANCH: &str = "main";

/// Result of [`GitSyncEngine::import_repository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRepository {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Head commit at import time; the anchor for the next commit
    pub latest_commit_sha: String,
    /// Imported files, all clean
    pub files: Vec<File>,
    /// Text files listed by the tree whose content could not be fetched
    pub dropped: Vec<(RepoFilePath, SyncError)>,
}

impl ImportedRepository {
    pub fn source(&self) -> RemoteSource {
        RemoteSource {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            base_commit_sha: self.latest_commit_sha.clone(),
        }
    }

    /// Fail unless every listed text file was fetched.
    ///
    /// A partial import must not be installed: the missing files would look
    /// deleted locally. When any fetch was refused by a limiter the error is
    /// `RateLimited` carrying the longest wait.
    pub fn ensure_complete(self) -> Result<Self> {
        let Some((first_path, first)) = self.dropped.first() else {
            return Ok(self);
        };
        let count = self.dropped.len();
        let wait = self.dropped.iter().filter_map(|(_, e)| e.retry_after()).max();
        let err = match wait {
            Some(wait) => SyncError::rate_limited(wait),
            None => SyncError::new(
                first.kind(),
                format!(
                    "{count} file(s) could not be fetched from {}/{} (first: {first_path}: {})",
                    self.owner,
                    self.repo,
                    first.message()
                ),
            ),
        };
        Err(err.with_context(CONTEXT))
    }
}

impl GitSyncEngine {
    /// Pull the default branch of `owner/repo` into a clean file set.
    ///
    /// Metadata, branch and tree lookups are fatal. Blob fetches run
    /// concurrently; a failed fetch lands in `dropped` and callers that
    /// install the result check [`ImportedRepository::ensure_complete`].
    pub async fn import_repository(
        &self,
        owner: &str,
        repo: &str,
        token: &Credential,
    ) -> Result<ImportedRepository> {
        require_non_empty(owner, "owner", CONTEXT)?;
        require_non_empty(repo, "repo", CONTEXT)?;
        require_token(token, CONTEXT)?;

        let client = self.client();
        let classified = |e: sync_remote::Error| classify(&e, Some(CONTEXT));

        let metadata = client.get_repository(token, owner, repo).await.map_err(classified)?;
        let branch = metadata
            .default_branch
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string());

        let head = client.get_branch(token, owner, repo, &branch).await.map_err(classified)?;
        let tree = client
            .get_tree_recursive(token, owner, repo, &head.commit.commit.tree.sha)
            .await
            .map_err(classified)?;
        if tree.truncated {
            warn!(owner, repo, %branch, "tree listing truncated by the remote, importing listed entries only");
        }

        let candidates: Vec<(RepoFilePath, TreeEntry)> = tree
            .tree
            .into_iter()
            .filter_map(|entry| self.importable(entry))
            .collect();

        let fetches = candidates.into_iter().map(|(path, entry)| async move {
            let result = client.get_blob(token, owner, repo, &entry.sha).await;
            (path, result)
        });

        let mut files = Vec::new();
        let mut dropped = Vec::new();
        for (path, result) in join_all(fetches).await {
            match result {
                Ok(blob) => {
                    let content = decode_blob_content(&blob.content, &blob.encoding);
                    files.push(File::clean(path, content));
                }
                Err(e) => {
                    let err = classify(&e, Some(CONTEXT));
                    warn!(path = %path, error = %err, "file failed to fetch");
                    dropped.push((path, err));
                }
            }
        }

        info!(
            owner,
            repo,
            %branch,
            files = files.len(),
            dropped = dropped.len(),
            head = %head.commit.sha,
            "import finished"
        );
        Ok(ImportedRepository {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch,
            latest_commit_sha: head.commit.sha,
            files,
            dropped,
        })
    }

    /// Blob entries with a valid path that look like text and fit the size ceiling.
    fn importable(&self, entry: TreeEntry) -> Option<(RepoFilePath, TreeEntry)> {
        if !entry.is_blob() || !self.classifier.is_likely_text(&entry.path, None) {
            return None;
        }
        if let Some(size) = entry.size.filter(|size| *size > self.max_file_bytes) {
            warn!(path = %entry.path, size, limit = self.max_file_bytes, "skipping oversized file");
            return None;
        }
        match RepoFilePath::parse(&entry.path) {
            Ok(path) => Some((path, entry)),
            Err(e) => {
                warn!(path = %entry.path, error = %e, "skipping entry with unusable path");
                None
            }
        }
    }
}
