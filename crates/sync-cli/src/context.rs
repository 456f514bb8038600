//! Shared command context: resolved config plus the sync engine

use std::path::Path;
use std::sync::Arc;

use sync_core::{GitSyncEngine, SyncConfig};
use sync_fs::NormalizedPath;
use sync_remote::{Credential, ReqwestTransport, Transport};
use tracing::debug;

use crate::cli::TokenArgs;
use crate::error::{CliError, Result};

pub struct Context {
    pub config: SyncConfig,
    pub engine: GitSyncEngine,
}

impl Context {
    /// Resolve configuration and build an engine over the real HTTP client.
    ///
    /// An explicit `--config` file must exist; the default location may not.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => SyncConfig::load(&NormalizedPath::new(path))?,
            None => match SyncConfig::default_path() {
                Some(path) => SyncConfig::load_or_default(&NormalizedPath::new(path))?,
                None => SyncConfig::default(),
            },
        };
        debug!(?config, "configuration resolved");
        Ok(Self::new(config, Arc::new(ReqwestTransport::new())))
    }

    pub fn new(config: SyncConfig, transport: Arc<dyn Transport>) -> Self {
        let engine = GitSyncEngine::from_config(&config, transport);
        Self { config, engine }
    }
}

/// The token from `--token` or `GITHUB_TOKEN`.
pub fn require_token(auth: &TokenArgs) -> Result<Credential> {
    match auth.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(Credential::new(token)),
        _ => Err(CliError::user(
            "A hosting API token is required (pass --token or set GITHUB_TOKEN)",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_rejected() {
        let auth = TokenArgs {
            token: Some("   ".into()),
        };
        assert!(matches!(require_token(&auth), Err(CliError::User { .. })));
        assert!(require_token(&TokenArgs { token: None }).is_err());
    }

    #[test]
    fn token_is_trimmed() {
        let auth = TokenArgs {
            token: Some(" ghp_x \n".into()),
        };
        assert_eq!(require_token(&auth).unwrap().expose(), "ghp_x");
    }

    #[test]
    fn explicit_missing_config_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(Context::load(Some(&missing)).is_err());
    }
}
