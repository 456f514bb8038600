//! Local directory adapter
//!
//! Mirrors project files into a directory the user granted access to, and
//! reads such a directory back as a set of text files.

use std::fs;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::text::TextClassifier;
use crate::{Error, NormalizedPath, RepoFilePath, Result, io};

/// Directory names never descended into when reading a local root.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target", "dist", "build"];

/// Capability handle to a granted root directory.
///
/// Every path written or read through the adapter is resolved beneath this
/// root; repo-relative paths cannot escape it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRoot {
    path: NormalizedPath,
}

impl LocalRoot {
    /// Open a root, failing if it is not an existing directory.
    pub fn open(path: impl Into<NormalizedPath>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(Error::RootMissing {
                path: path.to_native(),
            });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Resolve a repo-relative file beneath this root.
    pub fn resolve(&self, file: &RepoFilePath) -> NormalizedPath {
        self.path.join(file)
    }
}

/// A text file read from a local root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: RepoFilePath,
    pub content: String,
}

/// Reads and writes project files beneath a [`LocalRoot`].
#[derive(Debug, Clone)]
pub struct LocalDirectoryAdapter {
    max_file_bytes: u64,
}

impl LocalDirectoryAdapter {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    /// Write full content to `path` beneath `root`, creating every missing
    /// directory segment on the way.
    pub fn write_file(&self, root: &LocalRoot, path: &RepoFilePath, content: &str) -> Result<()> {
        let target = root.resolve(path);
        debug!(root = %root.path(), path = %path, bytes = content.len(), "writing local file");
        io::write_text(&target, content)
    }

    /// Current content of `path` beneath `root`, `None` when absent.
    pub fn read_file(&self, root: &LocalRoot, path: &RepoFilePath) -> Result<Option<String>> {
        let target = root.resolve(path).to_native();
        match fs::read_to_string(&target) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(target, e)),
        }
    }

    /// Delete `path` beneath `root` and any parent directories left empty.
    /// Returns whether the file existed.
    pub fn remove_file(&self, root: &LocalRoot, path: &RepoFilePath) -> Result<bool> {
        let target = root.resolve(path).to_native();
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::io(target, e)),
        }
        debug!(root = %root.path(), path = %path, "removed local file");

        let native_root = root.path().to_native();
        let mut parent = target.parent();
        while let Some(dir) = parent.filter(|dir| *dir != native_root && dir.starts_with(&native_root)) {
            // non-empty directories refuse removal, which ends the walk
            if fs::remove_dir(dir).is_err() {
                break;
            }
            parent = dir.parent();
        }
        Ok(true)
    }

    /// Read every likely-text file beneath `root`.
    ///
    /// Hidden and build directories are skipped, as are files that fail the
    /// classifier, exceed the size ceiling or are not valid UTF-8. Results are
    /// sorted by path.
    pub fn read_tree(
        &self,
        root: &LocalRoot,
        classifier: &dyn TextClassifier,
    ) -> Result<Vec<LocalFile>> {
        let native_root = root.path().to_native();
        let mut files = Vec::new();

        let walker = WalkDir::new(&native_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                match e.into_io_error() {
                    Some(source) => Error::io(path, source),
                    None => Error::io(path, std::io::Error::other("filesystem loop detected")),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&native_root) else {
                continue;
            };
            let relative = NormalizedPath::new(relative);
            let path = match RepoFilePath::parse(relative.as_str()) {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "skipping local entry with unusable path");
                    continue;
                }
            };

            if !classifier.is_likely_text(path.as_str(), None) {
                continue;
            }

            let size = entry
                .metadata()
                .map(|m| m.len())
                .map_err(|e| Error::io(entry.path(), e.into()))?;
            if size > self.max_file_bytes {
                warn!(path = %path, size, limit = self.max_file_bytes, "skipping oversized local file");
                continue;
            }

            let bytes = fs::read(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
            match String::from_utf8(bytes) {
                Ok(content) => files.push(LocalFile { path, content }),
                Err(_) => warn!(path = %path, "skipping local file that is not valid UTF-8"),
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}
