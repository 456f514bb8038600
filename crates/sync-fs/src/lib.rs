//! Filesystem layer for Project Sync
//!
//! Provides repo-relative path validation, atomic local I/O, the local
//! directory adapter used by `Local` project sources, the text classifier
//! that decides which entries become project files, and the format-agnostic
//! config store.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod local;
pub mod path;
pub mod text;

pub use checksum::compute_content_checksum;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use local::{LocalDirectoryAdapter, LocalFile, LocalRoot};
pub use path::{NormalizedPath, RepoFilePath};
pub use text::{ExtensionClassifier, TextClassifier};
