//! Error classification and secret sanitization
//!
//! [`classify`] is total: any error maps onto exactly one [`ErrorKind`].
//! Errors that arrive already typed by a lower layer keep their kind;
//! substring heuristics only apply to errors nothing else recognizes.

use std::error::Error as StdError;
use std::sync::LazyLock;

use regex::Regex;

use crate::assistant::AssistantError;
use crate::error::{ErrorKind, SyncError};

static BEARER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+").unwrap());
static HOSTING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:gh[pousr]_[A-Za-z0-9]{16,}|github_pat_[A-Za-z0-9_]{20,})").unwrap()
});
static API_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:sk-[A-Za-z0-9_-]{16,}|AIza[0-9A-Za-z_-]{30,})").unwrap()
});
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

/// Replace secret-shaped substrings with fixed placeholders.
pub fn sanitize(message: &str) -> String {
    let message = BEARER_TOKEN.replace_all(message, "Bearer [REDACTED]");
    let message = HOSTING_TOKEN.replace_all(&message, "[REDACTED_TOKEN]");
    let message = API_KEY.replace_all(&message, "[REDACTED_API_KEY]");
    EMAIL.replace_all(&message, "[REDACTED_EMAIL]").into_owned()
}

/// Classify any error into a [`SyncError`].
///
/// The error and its `source()` chain are searched for a pre-classified
/// error first; only when none is found does the message heuristic run.
pub fn classify(err: &(dyn StdError + 'static), context: Option<&str>) -> SyncError {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(candidate) = current {
        if let Some(classified) = classify_known(candidate) {
            return attach(classified, context);
        }
        current = candidate.source();
    }
    classify_message(&err.to_string(), context)
}

/// Heuristic classification of an unstructured message.
pub fn classify_message(message: &str, context: Option<&str>) -> SyncError {
    let lower = message.to_lowercase();
    let kind = if lower.contains("rate limit") || lower.contains("quota") {
        ErrorKind::RateLimited
    } else if lower.contains("network")
        || lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("fetch failed")
    {
        ErrorKind::Network
    } else if lower.contains("auth") || lower.contains("token") || lower.contains("credential") {
        ErrorKind::Auth
    } else {
        ErrorKind::System
    };
    attach(SyncError::new(kind, message), context)
}

fn attach(err: SyncError, context: Option<&str>) -> SyncError {
    match context {
        Some(context) => err.with_context(context),
        None => err,
    }
}

fn classify_known(err: &(dyn StdError + 'static)) -> Option<SyncError> {
    if let Some(err) = err.downcast_ref::<SyncError>() {
        return Some(err.clone());
    }
    if let Some(err) = err.downcast_ref::<sync_remote::Error>() {
        return Some(from_remote(err));
    }
    if let Some(err) = err.downcast_ref::<sync_fs::Error>() {
        return Some(from_fs(err));
    }
    if let Some(err) = err.downcast_ref::<AssistantError>() {
        return Some(from_assistant(err));
    }
    if let Some(err) = err.downcast_ref::<std::io::Error>() {
        return Some(SyncError::storage(err.to_string()));
    }
    if let Some(err) = err.downcast_ref::<serde_json::Error>() {
        return Some(SyncError::new(
            ErrorKind::System,
            format!("Malformed JSON: {err}"),
        ));
    }
    None
}

fn from_remote(err: &sync_remote::Error) -> SyncError {
    use sync_remote::Error;

    match err {
        Error::Auth { .. } => SyncError::new(ErrorKind::Auth, err.to_string()),
        Error::RateLimited { retry_after } => SyncError::rate_limited(*retry_after),
        Error::Transport { .. } => SyncError::new(ErrorKind::Network, err.to_string()),
        Error::NotFound { .. } | Error::Http { .. } | Error::Decode { .. } => {
            SyncError::remote(err.to_string())
        }
        Error::InvalidRequest { .. } => SyncError::new(ErrorKind::System, err.to_string()),
    }
}

fn from_fs(err: &sync_fs::Error) -> SyncError {
    match err {
        sync_fs::Error::InvalidPath { .. } => SyncError::validation(err.to_string()),
        _ => SyncError::storage(err.to_string()),
    }
}

fn from_assistant(err: &AssistantError) -> SyncError {
    match err {
        AssistantError::Quota(_) => SyncError::new(ErrorKind::RateLimited, err.to_string()),
        _ => SyncError::assistant(err.to_string()),
    }
}
