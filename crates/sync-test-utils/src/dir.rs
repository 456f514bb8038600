//! Temporary project directories.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// A temporary directory pre-populated with project files.
///
/// # Panics
/// Helpers panic on filesystem failures; this is test-only code.
pub struct TempProjectDir {
    temp_dir: TempDir,
}

impl TempProjectDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap_or_else(|e| panic!("TempProjectDir: {e}")),
        }
    }

    /// Create a directory holding the given `(relative path, content)` files.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let dir = Self::new();
        for (path, content) in files {
            dir.write(path, content);
        }
        dir
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let target = self.root().join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TempProjectDir: failed to create {}: {e}", parent.display()));
        }
        fs::write(&target, content)
            .unwrap_or_else(|e| panic!("TempProjectDir: failed to write {}: {e}", target.display()));
    }

    pub fn read(&self, relative: &str) -> String {
        let target = self.root().join(relative);
        fs::read_to_string(&target)
            .unwrap_or_else(|e| panic!("TempProjectDir: failed to read {}: {e}", target.display()))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }
}

impl Default for TempProjectDir {
    fn default() -> Self {
        Self::new()
    }
}
