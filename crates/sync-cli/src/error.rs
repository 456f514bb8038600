//! Error types for sync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Classified error from sync-core
    #[error(transparent)]
    Sync(#[from] sync_core::SyncError),

    /// Error from sync-fs
    #[error(transparent)]
    Fs(#[from] sync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Wait hint to show for rate-limited failures.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::Sync(err) => err.retry_after(),
            _ => None,
        }
    }
}
