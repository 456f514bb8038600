//! Synchronization engine for Project Sync
//!
//! This crate keeps projects (ordered path -> content file sets) consistent
//! with their durable home, implementing:
//!
//! - **ProjectStore**: projects, their sources and per-file dirty tracking
//! - **GitSyncEngine**: repository import and the blob/tree/commit/ref pipeline
//! - **Error classification**: one closed, sanitized error taxonomy
//! - **Assistant gateway**: rate-limited, shape-validated assistant calls
//! - **Workspace**: save orchestration over memory, local and remote sources
//!
//! # Architecture
//!
//! ```text
//!                 sync-cli
//!                    |
//!                sync-core
//!                    |
//!         +----------+----------+
//!         |                     |
//!      sync-fs             sync-remote
//! ```

pub mod assistant;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod workspace;

pub use assistant::{
    Assistant, AssistantError, AssistantGateway, AssistantOutput, AssistantRequest, GeneratedFile,
    OperationKind, parse_response,
};
pub use classify::{classify, classify_message, sanitize};
pub use config::{LimitsConfig, SyncConfig};
pub use engine::{Author, CommitOutcome, CommitRequest, GitSyncEngine, ImportedRepository};
pub use error::{ErrorKind, Result, SyncError};
pub use store::{
    File, Project, ProjectName, ProjectStore, RemoteSource, ReplaceMode, SourceDescriptor,
};
pub use workspace::{SaveOptions, SaveOutcome, Workspace};
