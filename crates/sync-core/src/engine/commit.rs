use chrono::{SecondsFormat, Utc};
use futures_util::future::join_all;
use sync_fs::RepoFilePath;
use sync_remote::api::{NewCommit, NewTree, NewTreeEntry, Signature};
use sync_remote::{Credential, encode_base64_utf8};
use tracing::{info, warn};

use super::{Author, GitSyncEngine, require_non_empty, require_token};
use crate::classify::classify;
use crate::store::File;
use crate::{Result, SyncError};

const CONTEXT: &str = "commit";

/// Everything needed to replay a batch of files as one commit.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Commit the new commit descends from
    pub base_commit_sha: String,
    pub files: Vec<File>,
    pub message: String,
    pub author: Author,
}

/// A successfully pushed commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// New head of the branch; the next commit's base
    pub commit_sha: String,
    pub tree_sha: String,
    /// Files that went into the commit, after the size guard
    pub committed: Vec<File>,
}

impl CommitOutcome {
    pub fn paths(&self) -> Vec<RepoFilePath> {
        self.committed.iter().map(|f| f.path.clone()).collect()
    }
}

impl GitSyncEngine {
    /// Push `request.files` as a new commit on top of `request.base_commit_sha`.
    ///
    /// Stages run strictly in order: base commit lookup, blob creation (all
    /// blobs concurrently, joined before moving on), tree, commit and finally
    /// the fast-forward ref update. Any failure aborts before the ref moves.
    pub async fn commit_files(&self, request: &CommitRequest, token: &Credential) -> Result<CommitOutcome> {
        validate(request)?;
        require_token(token, CONTEXT)?;
        let files = self.size_guard(&request.files)?;

        let client = self.client();
        let (owner, repo) = (request.owner.as_str(), request.repo.as_str());
        let classified = |e: sync_remote::Error| classify(&e, Some(CONTEXT));

        let base = client
            .get_commit(token, owner, repo, &request.base_commit_sha)
            .await
            .map_err(classified)?;

        let blobs = join_all(
            files
                .iter()
                .map(|file| client.create_blob(token, owner, repo, encode_base64_utf8(&file.content))),
        )
        .await
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(classified)?;

        let tree = NewTree {
            base_tree: base.tree.sha,
            tree: files
                .iter()
                .zip(blobs)
                .map(|(file, blob)| NewTreeEntry::blob(file.path.as_str(), blob.sha))
                .collect(),
        };
        let tree = client.create_tree(token, owner, repo, &tree).await.map_err(classified)?;

        let signature = Signature {
            name: request.author.name.clone(),
            email: request.author.email.clone(),
            date: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        };
        let commit = NewCommit {
            message: request.message.trim().to_string(),
            tree: tree.sha.clone(),
            parents: vec![request.base_commit_sha.clone()],
            author: signature.clone(),
            committer: signature,
        };
        let commit = client.create_commit(token, owner, repo, &commit).await.map_err(classified)?;

        client
            .update_branch_ref(token, owner, repo, &request.branch, &commit.sha)
            .await
            .map_err(|e| match e {
                sync_remote::Error::Http { status: 409 | 422, .. } => SyncError::remote(format!(
                    "Branch '{}' has moved since it was imported; re-import the repository and try again",
                    request.branch
                ))
                .with_context(CONTEXT),
                other => classified(other),
            })?;

        info!(owner, repo, branch = %request.branch, commit = %commit.sha, files = files.len(), "commit pushed");
        Ok(CommitOutcome {
            commit_sha: commit.sha,
            tree_sha: tree.sha,
            committed: files,
        })
    }

    /// Drop files over the size ceiling, failing if nothing is left.
    fn size_guard(&self, files: &[File]) -> Result<Vec<File>> {
        let kept: Vec<File> = files
            .iter()
            .filter(|file| {
                let size = file.content.len() as u64;
                let fits = size <= self.max_file_bytes;
                if !fits {
                    warn!(path = %file.path, size, limit = self.max_file_bytes, "dropping oversized file from commit");
                }
                fits
            })
            .cloned()
            .collect();

        if kept.is_empty() {
            return Err(SyncError::validation("Every file exceeds the size limit; nothing to commit")
                .with_context(CONTEXT));
        }
        Ok(kept)
    }
}

fn validate(request: &CommitRequest) -> Result<()> {
    require_non_empty(&request.owner, "owner", CONTEXT)?;
    require_non_empty(&request.repo, "repo", CONTEXT)?;
    require_non_empty(&request.branch, "branch", CONTEXT)?;
    require_non_empty(&request.base_commit_sha, "base commit", CONTEXT)?;
    require_non_empty(&request.message, "commit message", CONTEXT)?;
    require_non_empty(&request.author.name, "author name", CONTEXT)?;
    require_non_empty(&request.author.email, "author email", CONTEXT)?;
    if request.files.is_empty() {
        return Err(SyncError::validation("No files to commit").with_context(CONTEXT));
    }
    Ok(())
}
