//! Error types for sync-remote

use std::time::Duration;

/// Result type for sync-remote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the hosting API
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// 401/403: credential invalid, expired or missing scope
    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Not found: {endpoint}")]
    NotFound { endpoint: String },

    /// Refused locally by the rate limiter or by a 429 from the server
    #[error("Rate limit exceeded, retry in {}s", retry_after.as_secs_f32().ceil())]
    RateLimited { retry_after: Duration },

    /// Any other non-2xx response
    #[error("Hosting API error ({status}): {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
