//! Typed error taxonomy for sync-core
//!
//! Every public operation of this crate fails with a [`SyncError`]: a closed
//! [`ErrorKind`] plus a sanitized human message. Errors from lower crates are
//! converted through [`crate::classify`] before they leave this crate.

use std::fmt;
use std::time::Duration;

/// Result type for sync-core operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// The closed set of error kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input; never retried
    Validation,
    /// Transient connectivity failure; retry is the caller's choice
    Network,
    /// Credential invalid, expired or missing scope
    Auth,
    /// Refused by a rate limiter or the remote; carries a wait hint
    RateLimited,
    /// Non-2xx from the hosting API not covered above
    RemoteService,
    /// Assistant call failed or returned a malformed payload
    AssistantService,
    /// Local persistence failure
    Storage,
    /// Anything unclassified
    System,
}

impl ErrorKind {
    /// Stable machine-checkable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::RemoteService => "remote_service",
            Self::AssistantService => "assistant_service",
            Self::Storage => "storage",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified, sanitized error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    kind: ErrorKind,
    message: String,
    context: Option<String>,
    retry_after: Option<Duration>,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{context}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for SyncError {}

impl SyncError {
    /// Build an error; the message is sanitized on the way in.
    pub fn new(kind: ErrorKind, message: impl AsRef<str>) -> Self {
        Self {
            kind,
            message: crate::classify::sanitize(message.as_ref()),
            context: None,
            retry_after: None,
        }
    }

    pub fn validation(message: impl AsRef<str>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn storage(message: impl AsRef<str>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn remote(message: impl AsRef<str>) -> Self {
        Self::new(ErrorKind::RemoteService, message)
    }

    pub fn assistant(message: impl AsRef<str>) -> Self {
        Self::new(ErrorKind::AssistantService, message)
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        let mut err = Self::new(
            ErrorKind::RateLimited,
            format!(
                "Rate limit exceeded, retry in {}s",
                retry_after.as_secs_f32().ceil()
            ),
        );
        err.retry_after = Some(retry_after);
        err
    }

    /// Attach the operation the error happened in, keeping any existing one.
    pub fn with_context(mut self, context: impl AsRef<str>) -> Self {
        if self.context.is_none() {
            self.context = Some(crate::classify::sanitize(context.as_ref()));
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Wait hint for `RateLimited` errors.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

impl From<sync_remote::Error> for SyncError {
    fn from(err: sync_remote::Error) -> Self {
        crate::classify::classify(&err, None)
    }
}

impl From<sync_fs::Error> for SyncError {
    fn from(err: sync_fs::Error) -> Self {
        crate::classify::classify(&err, None)
    }
}
