//! Project and file types

use std::fmt;

use serde::{Deserialize, Serialize};
use sync_fs::RepoFilePath;

use crate::store::source::SourceDescriptor;
use crate::{Result, SyncError};

/// Maximum project name length, in characters.
pub const MAX_PROJECT_NAME_LEN: usize = 50;

/// A validated project name.
///
/// 1 to 50 characters after trimming, drawn from ASCII letters, digits,
/// space, `-`, `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SyncError::validation("Project name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(SyncError::validation(format!(
                "Project name cannot exceed {MAX_PROJECT_NAME_LEN} characters"
            )));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.')))
        {
            return Err(SyncError::validation(format!(
                "Project name contains invalid character '{bad}'"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectName {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ProjectName> for String {
    fn from(name: ProjectName) -> Self {
        name.0
    }
}

/// A project file.
///
/// `dirty` means the content differs from the last state known to be
/// persisted at the project's source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub path: RepoFilePath,
    pub content: String,
    pub dirty: bool,
}

impl File {
    /// A file matching its persisted state, as produced by an import.
    pub fn clean(path: RepoFilePath, content: impl Into<String>) -> Self {
        Self {
            path,
            content: content.into(),
            dirty: false,
        }
    }

    /// A file not yet persisted, as produced by an edit or generation.
    pub fn dirty(path: RepoFilePath, content: impl Into<String>) -> Self {
        Self {
            path,
            content: content.into(),
            dirty: true,
        }
    }
}

/// A named, insertion-ordered set of files with unique paths, bound to
/// exactly one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub(crate) name: ProjectName,
    pub(crate) files: Vec<File>,
    pub(crate) source: SourceDescriptor,
}

impl Project {
    pub fn name(&self) -> &ProjectName {
        &self.name
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn file(&self, path: &RepoFilePath) -> Option<&File> {
        self.files.iter().find(|f| &f.path == path)
    }

    pub fn dirty_files(&self) -> impl Iterator<Item = &File> {
        self.files.iter().filter(|f| f.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.files.iter().any(|f| f.dirty)
    }
}

/// Collapse duplicate paths, keeping the last write at the position of the
/// first occurrence.
pub(crate) fn dedup_last_wins(files: Vec<File>) -> Vec<File> {
    let mut result: Vec<File> = Vec::with_capacity(files.len());
    for file in files {
        match result.iter_mut().find(|existing| existing.path == file.path) {
            Some(existing) => *existing = file,
            None => result.push(file),
        }
    }
    result
}
