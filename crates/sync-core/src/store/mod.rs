//! ProjectStore: project name -> files + source, with per-file dirty tracking
//!
//! Every mutation of a project's file list builds the new list and swaps it
//! in whole, so a reader never sees a half-applied update.

mod project;
mod source;

pub use project::{File, MAX_PROJECT_NAME_LEN, Project, ProjectName};
pub use source::{RemoteSource, SourceDescriptor};

use sync_fs::RepoFilePath;
use tracing::debug;

use crate::{Result, SyncError};
use project::dedup_last_wins;

/// How [`ProjectStore::replace_files`] combines incoming files with the
/// existing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Overwrite matching paths, append new ones, keep the rest
    Merge,
    /// Discard the existing list entirely
    Full,
}

/// In-memory registry of projects in insertion order.
#[derive(Debug, Default)]
pub struct ProjectStore {
    projects: Vec<Project>,
    active: Option<ProjectName>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty or seeded project backed by memory.
    ///
    /// Seeded files start dirty since nothing has persisted them.
    pub fn create_project(
        &mut self,
        name: &str,
        files: Option<Vec<(RepoFilePath, String)>>,
    ) -> Result<&Project> {
        let files = files
            .unwrap_or_default()
            .into_iter()
            .map(|(path, content)| File::dirty(path, content))
            .collect();
        self.insert_project(name, files, SourceDescriptor::Memory)
    }

    /// Create a project together with its source.
    ///
    /// The first project created becomes the active one.
    pub fn insert_project(
        &mut self,
        name: &str,
        files: Vec<File>,
        source: SourceDescriptor,
    ) -> Result<&Project> {
        let name = ProjectName::parse(name)?;
        if self.position(name.as_str()).is_some() {
            return Err(SyncError::validation(format!(
                "Project '{name}' already exists"
            )));
        }

        debug!(project = %name, source = source.kind(), files = files.len(), "creating project");
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        self.projects.push(Project {
            name,
            files: dedup_last_wins(files),
            source,
        });
        let index = self.projects.len() - 1;
        Ok(&self.projects[index])
    }

    /// Delete a project and its source.
    ///
    /// If it was active, the earliest remaining project becomes active.
    pub fn delete_project(&mut self, name: &str) -> Result<Project> {
        let index = self.require(name)?;
        let removed = self.projects.remove(index);

        if self.active.as_ref() == Some(&removed.name) {
            self.active = self.projects.first().map(|p| p.name.clone());
        }
        debug!(project = %removed.name, "deleted project");
        Ok(removed)
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.position(name).map(|i| &self.projects[i])
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn names(&self) -> Vec<&ProjectName> {
        self.projects.iter().map(|p| &p.name).collect()
    }

    pub fn active(&self) -> Option<&Project> {
        self.active.as_ref().and_then(|name| self.project(name.as_str()))
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let index = self.require(name)?;
        self.active = Some(self.projects[index].name.clone());
        Ok(())
    }

    /// Set a file's content, creating it if absent. The file becomes dirty
    /// whatever the project's source.
    pub fn update_file(&mut self, name: &str, path: &RepoFilePath, content: &str) -> Result<()> {
        let index = self.require(name)?;
        let project = &mut self.projects[index];

        let mut files = project.files.clone();
        match files.iter_mut().find(|f| &f.path == path) {
            Some(file) => {
                file.content = content.to_string();
                file.dirty = true;
            }
            None => files.push(File::dirty(path.clone(), content)),
        }
        project.files = files;
        Ok(())
    }

    /// Remove a file. Returns whether it existed.
    pub fn delete_file(&mut self, name: &str, path: &RepoFilePath) -> Result<bool> {
        let index = self.require(name)?;
        let project = &mut self.projects[index];

        let before = project.files.len();
        let files: Vec<File> = project
            .files
            .iter()
            .filter(|f| &f.path != path)
            .cloned()
            .collect();
        let removed = files.len() != before;
        project.files = files;
        Ok(removed)
    }

    /// Clear the dirty flag on `paths`, or on every file when `None`.
    pub fn mark_clean(&mut self, name: &str, paths: Option<&[RepoFilePath]>) -> Result<()> {
        let index = self.require(name)?;
        let project = &mut self.projects[index];

        project.files = project
            .files
            .iter()
            .cloned()
            .map(|mut file| {
                if paths.is_none_or(|paths| paths.contains(&file.path)) {
                    file.dirty = false;
                }
                file
            })
            .collect();
        Ok(())
    }

    /// Clear the dirty flag only where the current content still equals what
    /// was persisted. Returns the number of files cleaned.
    pub(crate) fn mark_persisted(&mut self, name: &str, persisted: &[File]) -> Result<usize> {
        let index = self.require(name)?;
        let project = &mut self.projects[index];

        let mut cleaned = 0;
        project.files = project
            .files
            .iter()
            .cloned()
            .map(|mut file| {
                let unchanged = persisted
                    .iter()
                    .any(|p| p.path == file.path && p.content == file.content);
                if unchanged && file.dirty {
                    file.dirty = false;
                    cleaned += 1;
                }
                file
            })
            .collect();
        Ok(cleaned)
    }

    /// Replace or merge a batch of files, keeping each incoming file's dirty
    /// flag as given.
    pub fn replace_files(&mut self, name: &str, files: Vec<File>, mode: ReplaceMode) -> Result<()> {
        let index = self.require(name)?;
        let project = &mut self.projects[index];
        let incoming = dedup_last_wins(files);

        project.files = match mode {
            ReplaceMode::Full => incoming,
            ReplaceMode::Merge => {
                let mut merged = project.files.clone();
                for file in incoming {
                    match merged.iter_mut().find(|existing| existing.path == file.path) {
                        Some(existing) => *existing = file,
                        None => merged.push(file),
                    }
                }
                merged
            }
        };
        Ok(())
    }

    /// Snapshot of the dirty files of a project.
    pub fn dirty_files(&self, name: &str) -> Result<Vec<File>> {
        let index = self.require(name)?;
        Ok(self.projects[index].dirty_files().cloned().collect())
    }

    /// Rebind a project's source after a successful import or commit.
    pub(crate) fn set_source(&mut self, name: &str, source: SourceDescriptor) -> Result<()> {
        let index = self.require(name)?;
        self.projects[index].source = source;
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.projects.iter().position(|p| p.name.as_str() == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| SyncError::validation(format!("Project '{}' does not exist", name.trim())))
    }
}
