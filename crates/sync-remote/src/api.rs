//! Wire objects of the hosting API

use serde::{Deserialize, Serialize};

/// File mode for regular, non-executable blobs.
pub const FILE_MODE: &str = "100644";

/// `GET /repos/{o}/{r}`
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// `GET /repos/{o}/{r}/branches/{b}`
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: BranchCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
    pub commit: CommitSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub tree: ObjectRef,
}

/// Any `{ "sha": ... }` shaped object reference or creation result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectRef {
    pub sha: String,
}

/// `GET /repos/{o}/{r}/git/trees/{sha}?recursive=1`
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub sha: String,
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// `GET /repos/{o}/{r}/git/blobs/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct Blob {
    pub content: String,
    pub encoding: String,
}

/// `POST /repos/{o}/{r}/git/blobs`
#[derive(Debug, Clone, Serialize)]
pub struct NewBlob {
    pub content: String,
    pub encoding: &'static str,
}

/// `POST /repos/{o}/{r}/git/trees`
#[derive(Debug, Clone, Serialize)]
pub struct NewTree {
    pub base_tree: String,
    pub tree: Vec<NewTreeEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTreeEntry {
    pub path: String,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: String,
}

impl NewTreeEntry {
    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FILE_MODE,
            kind: "blob",
            sha: sha.into(),
        }
    }
}

/// `GET /repos/{o}/{r}/git/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub tree: ObjectRef,
}

/// Author and committer identity of a new commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<String>,
}

/// `POST /repos/{o}/{r}/git/commits`
#[derive(Debug, Clone, Serialize)]
pub struct NewCommit {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: Signature,
    pub committer: Signature,
}

/// `PATCH /repos/{o}/{r}/git/refs/heads/{b}`
#[derive(Debug, Clone, Serialize)]
pub struct RefUpdate {
    pub sha: String,
    pub force: bool,
}

/// `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of `GET /user/emails`
#[derive(Debug, Clone, Deserialize)]
pub struct UserEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Server error payload, `{ "message": ... }`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
