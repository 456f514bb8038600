//! Path handling for local roots and repo-relative project files

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A native path normalized to use forward slashes internally.
///
/// Used for local directory roots; converted back to a platform-native
/// `PathBuf` only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a repo-relative file path.
    pub fn join(&self, file: &RepoFilePath) -> Self {
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, file.as_str())
        } else {
            format!("{}/{}", self.inner, file.as_str())
        };
        Self { inner: joined }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

/// A validated, repo-relative file path.
///
/// Forward-slash separated, non-empty, no leading slash, and no `.`, `..`
/// or empty segments. Backslashes are accepted on input and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoFilePath(String);

impl RepoFilePath {
    /// Validate and normalize a repo-relative path.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.replace('\\', "/");

        if normalized.is_empty() {
            return Err(Error::invalid_path(raw, "path is empty"));
        }
        if normalized.starts_with('/') {
            return Err(Error::invalid_path(raw, "path must be relative"));
        }
        if normalized.contains('\0') {
            return Err(Error::invalid_path(raw, "path contains a NUL byte"));
        }
        for segment in normalized.split('/') {
            match segment {
                "" => return Err(Error::invalid_path(raw, "path has an empty segment")),
                "." | ".." => {
                    return Err(Error::invalid_path(
                        raw,
                        format!("path contains a '{segment}' segment"),
                    ));
                }
                _ => {}
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The extension of the final segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        let idx = name.rfind('.')?;
        if idx == 0 { None } else { Some(&name[idx + 1..]) }
    }

    /// Iterate over the directory segments leading to the file.
    pub fn parent_segments(&self) -> impl Iterator<Item = &str> {
        let mut segments: Vec<&str> = self.0.split('/').collect();
        segments.pop();
        segments.into_iter()
    }
}

impl fmt::Display for RepoFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoFilePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RepoFilePath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl Serialize for RepoFilePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RepoFilePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
