//! Durable backing of a project

use serde::{Deserialize, Serialize};
use sync_fs::LocalRoot;

/// Where a project's files durably live.
///
/// Consumers match exhaustively, so adding a backend means adding a variant
/// and updating every match site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// No durable backing; content lives only in memory
    Memory,
    /// A granted local directory
    Local(LocalRoot),
    /// A branch of a repository on the hosting API
    Remote(RemoteSource),
}

impl SourceDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Local(_) => "local",
            Self::Remote(_) => "remote",
        }
    }
}

/// Coordinates of a remote-backed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Last commit the local state descends from; anchor for the next commit
    pub base_commit_sha: String,
}
