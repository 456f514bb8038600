//! GitSyncEngine: moves project files to and from a hosted Git repository
//!
//! - **import**: pull a branch's tree into a clean file set
//! - **commit**: replay dirty files as blob, tree, commit and ref update
//! - **identity**: resolve the commit author from the authenticated account

mod commit;
mod import;

pub use commit::{CommitOutcome, CommitRequest};
pub use import::ImportedRepository;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sync_fs::{ExtensionClassifier, TextClassifier};
use sync_remote::{Credential, RateLimiter, RemoteObjectClient, Transport};
use tracing::debug;

use crate::classify::classify;
use crate::config::SyncConfig;
use crate::{ErrorKind, Result, SyncError};

/// Author and committer of new commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Import and commit orchestration over a [`RemoteObjectClient`].
pub struct GitSyncEngine {
    client: RemoteObjectClient,
    classifier: Arc<dyn TextClassifier>,
    max_file_bytes: u64,
}

impl GitSyncEngine {
    pub fn new(
        client: RemoteObjectClient,
        classifier: Arc<dyn TextClassifier>,
        max_file_bytes: u64,
    ) -> Self {
        Self {
            client,
            classifier,
            max_file_bytes,
        }
    }

    /// Engine over `transport` with its own hosting-API limiter and the
    /// extension-based text classifier.
    pub fn from_config(config: &SyncConfig, transport: Arc<dyn Transport>) -> Self {
        let limiter = Arc::new(RateLimiter::new("hosting", config.limits.hosting));
        let client = RemoteObjectClient::new(config.remote.clone(), limiter, transport);
        Self::new(client, Arc::new(ExtensionClassifier::new()), config.max_file_bytes)
    }

    pub fn client(&self) -> &RemoteObjectClient {
        &self.client
    }

    /// Size ceiling applied on import and by the commit size guard.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Resolve the commit author for `token`.
    ///
    /// The account must have a primary, verified email. The display name
    /// falls back to the login.
    pub async fn verify_identity(&self, token: &Credential) -> Result<Author> {
        const CONTEXT: &str = "identity check";
        require_token(token, CONTEXT)?;

        let user = self
            .client
            .get_user(token)
            .await
            .map_err(|e| classify(&e, Some(CONTEXT)))?;
        let emails = self
            .client
            .get_user_emails(token)
            .await
            .map_err(|e| classify(&e, Some(CONTEXT)))?;

        let email = emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .ok_or_else(|| {
                SyncError::new(
                    ErrorKind::Auth,
                    format!("Account '{}' has no primary verified email", user.login),
                )
                .with_context(CONTEXT)
            })?;

        let name = user
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.login.clone());
        debug!(login = %user.login, "identity verified");
        Ok(Author::new(name, email.email))
    }
}

impl fmt::Debug for GitSyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitSyncEngine")
            .field("client", &self.client)
            .field("max_file_bytes", &self.max_file_bytes)
            .finish_non_exhaustive()
    }
}

fn require_token(token: &Credential, context: &str) -> Result<()> {
    if token.is_empty() {
        return Err(SyncError::new(ErrorKind::Auth, "A hosting API token is required").with_context(context));
    }
    Ok(())
}

fn require_non_empty(value: &str, field: &str, context: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::validation(format!("{field} cannot be empty")).with_context(context));
    }
    Ok(())
}
