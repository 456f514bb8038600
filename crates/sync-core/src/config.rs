//! Runtime configuration
//!
//! All fields are defaulted, so an absent or partial config file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sync_fs::{ConfigStore, NormalizedPath};
use sync_remote::{ClientConfig, RateLimitConfig};

use crate::{Result, SyncError};

/// Directory under the user config dir holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "project-sync";

/// Default size ceiling for a single file (1 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub remote: ClientConfig,
    pub limits: LimitsConfig,
    /// Files larger than this are skipped on import and dropped from commits
    pub max_file_bytes: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote: ClientConfig::default(),
            limits: LimitsConfig::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// One limiter per remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub hosting: RateLimitConfig,
    pub assistant: RateLimitConfig,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            hosting: RateLimitConfig::new(300, Duration::from_secs(60)),
            assistant: RateLimitConfig::new(10, Duration::from_secs(60)),
        }
    }
}

impl SyncConfig {
    /// Load from `path` (TOML, JSON or YAML by extension).
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let config: Self = ConfigStore::new().load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &NormalizedPath) -> Result<Self> {
        let config: Self = ConfigStore::new().load_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that cannot be enforced.
    pub fn validate(&self) -> Result<()> {
        for (name, limit) in [("hosting", &self.limits.hosting), ("assistant", &self.limits.assistant)] {
            limit
                .validate()
                .map_err(|e| SyncError::validation(e.to_string()).with_context(format!("limits.{name}")))?;
        }
        Ok(())
    }

    /// `<user config dir>/project-sync/config.toml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }
}
