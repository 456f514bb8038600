//! Workspace: the store plus the collaborators that persist it
//!
//! Saving dispatches on the project's [`SourceDescriptor`]. Store locks are
//! never held across an `.await`; remote work runs on a snapshot and the
//! result is applied afterwards.

use std::sync::Arc;

use parking_lot::RwLock;
use sync_fs::{
    ExtensionClassifier, LocalDirectoryAdapter, LocalRoot, NormalizedPath, RepoFilePath, TextClassifier,
};
use sync_remote::{Credential, Transport};
use tracing::{info, warn};

use crate::assistant::AssistantOutput;
use crate::classify::classify;
use crate::config::SyncConfig;
use crate::engine::{CommitRequest, GitSyncEngine};
use crate::store::{File, Project, ProjectName, ProjectStore, RemoteSource, ReplaceMode, SourceDescriptor};
use crate::{ErrorKind, Result, SyncError};

/// Inputs for [`Workspace::save`]. Only remote projects use them.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub token: Option<Credential>,
    pub message: Option<String>,
}

/// What a save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Memory project; nothing durable to write
    Ephemeral,
    /// No dirty files
    Unchanged,
    /// Dirty files written to the local root
    Flushed { paths: Vec<RepoFilePath> },
    /// Dirty files pushed as a new commit
    Committed {
        commit_sha: String,
        paths: Vec<RepoFilePath>,
    },
}

pub struct Workspace {
    store: Arc<RwLock<ProjectStore>>,
    engine: GitSyncEngine,
    local: LocalDirectoryAdapter,
    classifier: Arc<dyn TextClassifier>,
}

impl Workspace {
    /// Build a workspace talking to the hosting API through `transport`.
    pub fn new(config: &SyncConfig, transport: Arc<dyn Transport>) -> Self {
        Self::from_parts(
            GitSyncEngine::from_config(config, transport),
            LocalDirectoryAdapter::new(config.max_file_bytes),
            Arc::new(ExtensionClassifier::new()),
        )
    }

    pub fn from_parts(
        engine: GitSyncEngine,
        local: LocalDirectoryAdapter,
        classifier: Arc<dyn TextClassifier>,
    ) -> Self {
        Self {
            store: Arc::new(RwLock::new(ProjectStore::new())),
            engine,
            local,
            classifier,
        }
    }

    /// Shared handle to the project store.
    pub fn store(&self) -> &Arc<RwLock<ProjectStore>> {
        &self.store
    }

    pub fn engine(&self) -> &GitSyncEngine {
        &self.engine
    }

    /// Snapshot of a project.
    pub fn project(&self, name: &str) -> Option<Project> {
        self.store.read().project(name).cloned()
    }

    pub fn create_project(&self, name: &str, seeds: Option<Vec<(RepoFilePath, String)>>) -> Result<()> {
        self.store.write().create_project(name, seeds)?;
        Ok(())
    }

    pub fn update_file(&self, name: &str, path: &RepoFilePath, content: &str) -> Result<()> {
        self.store.write().update_file(name, path, content)
    }

    /// Import `owner/repo` as a new project.
    pub async fn import_remote(
        &self,
        name: &str,
        owner: &str,
        repo: &str,
        token: &Credential,
    ) -> Result<RemoteSource> {
        self.ensure_available(name)?;

        let imported = self
            .engine
            .import_repository(owner, repo, token)
            .await?
            .ensure_complete()?;
        let source = imported.source();
        self.store
            .write()
            .insert_project(name, imported.files, SourceDescriptor::Remote(source.clone()))?;
        Ok(source)
    }

    /// Replace a remote project's files with a fresh import and move its
    /// anchor to the current head.
    ///
    /// Unsaved edits survive: every dirty file is laid back over the fresh
    /// import and stays dirty, so the next save commits it on the new head.
    /// Edits that now equal the upstream content become clean.
    pub async fn reimport_remote(&self, name: &str, token: &Credential) -> Result<RemoteSource> {
        let current = match self.source_of(name)? {
            SourceDescriptor::Remote(remote) => remote,
            other => {
                return Err(SyncError::validation(format!(
                    "Project '{}' is backed by {}, not a remote repository",
                    name.trim(),
                    other.kind()
                )));
            }
        };

        let imported = self
            .engine
            .import_repository(&current.owner, &current.repo, token)
            .await?
            .ensure_complete()?;
        let source = imported.source();

        let mut store = self.store.write();
        let pending: Vec<File> = store
            .dirty_files(name)?
            .into_iter()
            .filter(|edit| {
                !imported
                    .files
                    .iter()
                    .any(|fresh| fresh.path == edit.path && fresh.content == edit.content)
            })
            .collect();
        let kept = pending.len();
        store.replace_files(name, imported.files, ReplaceMode::Full)?;
        store.replace_files(name, pending, ReplaceMode::Merge)?;
        store.set_source(name, SourceDescriptor::Remote(source.clone()))?;
        info!(
            project = name.trim(),
            base = %source.base_commit_sha,
            kept_edits = kept,
            "re-import complete"
        );
        Ok(source)
    }

    /// Import a granted local directory as a new project. Returns the number
    /// of files read.
    pub fn import_local(&self, name: &str, root: impl Into<NormalizedPath>) -> Result<usize> {
        self.ensure_available(name)?;

        let root = LocalRoot::open(root).map_err(|e| classify(&e, Some("local import")))?;
        let files: Vec<File> = self
            .local
            .read_tree(&root, self.classifier.as_ref())
            .map_err(|e| classify(&e, Some("local import")))?
            .into_iter()
            .map(|f| File::clean(f.path, f.content))
            .collect();
        let count = files.len();

        self.store
            .write()
            .insert_project(name, files, SourceDescriptor::Local(root))?;
        info!(project = name.trim(), files = count, "local import complete");
        Ok(count)
    }

    /// Persist a project's dirty files to its source.
    ///
    /// Afterwards only files whose content still equals what was persisted
    /// are marked clean.
    pub async fn save(&self, name: &str, options: SaveOptions) -> Result<SaveOutcome> {
        let (source, dirty) = {
            let store = self.store.read();
            let project = store
                .project(name)
                .ok_or_else(|| SyncError::validation(format!("Project '{}' does not exist", name.trim())))?;
            (project.source().clone(), project.dirty_files().cloned().collect::<Vec<_>>())
        };

        match source {
            SourceDescriptor::Memory => Ok(SaveOutcome::Ephemeral),
            SourceDescriptor::Local(_) | SourceDescriptor::Remote(_) if dirty.is_empty() => {
                Ok(SaveOutcome::Unchanged)
            }
            SourceDescriptor::Local(root) => self.flush_local(name, &root, dirty),
            SourceDescriptor::Remote(remote) => self.commit_remote(name, remote, dirty, options).await,
        }
    }

    fn flush_local(&self, name: &str, root: &LocalRoot, dirty: Vec<File>) -> Result<SaveOutcome> {
        let mut written = Vec::with_capacity(dirty.len());
        let mut failure = None;
        for file in dirty {
            match self.local.write_file(root, &file.path, &file.content) {
                Ok(()) => written.push(file),
                Err(e) => {
                    failure = Some(classify(&e, Some("flush")));
                    break;
                }
            }
        }

        self.store.write().mark_persisted(name, &written)?;
        if let Some(err) = failure {
            return Err(err);
        }

        info!(project = name.trim(), files = written.len(), "flushed to local directory");
        Ok(SaveOutcome::Flushed {
            paths: written.into_iter().map(|f| f.path).collect(),
        })
    }

    async fn commit_remote(
        &self,
        name: &str,
        remote: RemoteSource,
        dirty: Vec<File>,
        options: SaveOptions,
    ) -> Result<SaveOutcome> {
        let message = options
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| SyncError::validation("A commit message is required").with_context("commit"))?;
        let token = options
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SyncError::new(ErrorKind::Auth, "A hosting API token is required").with_context("commit"))?;

        let author = self.engine.verify_identity(&token).await?;
        let request = CommitRequest {
            owner: remote.owner.clone(),
            repo: remote.repo.clone(),
            branch: remote.branch.clone(),
            base_commit_sha: remote.base_commit_sha.clone(),
            files: dirty,
            message,
            author,
        };
        let outcome = self.engine.commit_files(&request, &token).await?;

        let mut store = self.store.write();
        if store.project(name).is_some() {
            store.mark_persisted(name, &outcome.committed)?;
            store.set_source(
                name,
                SourceDescriptor::Remote(RemoteSource {
                    base_commit_sha: outcome.commit_sha.clone(),
                    ..remote
                }),
            )?;
        } else {
            warn!(project = name.trim(), commit = %outcome.commit_sha, "project deleted while its commit was in flight");
        }

        Ok(SaveOutcome::Committed {
            paths: outcome.paths(),
            commit_sha: outcome.commit_sha,
        })
    }

    /// Merge assistant-proposed files into a project. Returns how many files
    /// were applied.
    pub fn apply_assistant_output(&self, name: &str, output: AssistantOutput) -> Result<usize> {
        let files = output.into_files();
        let count = files.len();
        if count > 0 {
            self.store.write().replace_files(name, files, ReplaceMode::Merge)?;
        }
        Ok(count)
    }

    /// Create a memory project from generated files.
    pub fn create_generated_project(&self, name: &str, output: AssistantOutput) -> Result<usize> {
        let files = output.into_files();
        if files.is_empty() {
            return Err(SyncError::validation("The assistant produced no files"));
        }
        let count = files.len();
        self.store
            .write()
            .insert_project(name, files, SourceDescriptor::Memory)?;
        Ok(count)
    }

    fn source_of(&self, name: &str) -> Result<SourceDescriptor> {
        self.store
            .read()
            .project(name)
            .map(|p| p.source().clone())
            .ok_or_else(|| SyncError::validation(format!("Project '{}' does not exist", name.trim())))
    }

    /// Fail early, before any I/O, on names that could never be inserted.
    fn ensure_available(&self, name: &str) -> Result<ProjectName> {
        let name = ProjectName::parse(name)?;
        if self.store.read().project(name.as_str()).is_some() {
            return Err(SyncError::validation(format!("Project '{name}' already exists")));
        }
        Ok(name)
    }
}
