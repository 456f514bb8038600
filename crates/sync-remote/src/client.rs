//! Authenticated, rate-limited client for the hosting API object endpoints

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::{
    Blob, Branch, ErrorBody, GitCommit, NewBlob, NewCommit, NewTree, ObjectRef, RefUpdate,
    Repository, Tree, User, UserEmail,
};
use crate::rate_limit::RateLimiter;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::{Error, Result};

/// Wait hint for a server-side 429 without a `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Bearer token for the hosting API.
///
/// `Debug` never reveals the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Endpoint and header settings for the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Versioned media type sent as `Accept`
    pub accept: String,
    /// Sent as `X-GitHub-Api-Version`
    pub api_version: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            accept: "application/vnd.github+json".to_string(),
            api_version: "2022-11-28".to_string(),
            user_agent: concat!("project-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Thin authenticated wrapper over the hosting API.
///
/// Every call is first admitted by the shared hosting-API [`RateLimiter`];
/// a refused call fails with [`Error::RateLimited`] without touching the
/// network.
#[derive(Clone)]
pub struct RemoteObjectClient {
    config: ClientConfig,
    limiter: Arc<RateLimiter>,
    transport: Arc<dyn Transport>,
}

impl RemoteObjectClient {
    pub fn new(config: ClientConfig, limiter: Arc<RateLimiter>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            limiter,
            transport,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Issue one call. Returns `None` for `204 No Content` and empty bodies.
    pub async fn call(
        &self,
        token: &Credential,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>> {
        self.limiter.try_admit()?;

        let request = HttpRequest {
            method,
            url: format!("{}{}", self.config.api_base_url.trim_end_matches('/'), endpoint),
            endpoint: endpoint.to_string(),
            headers: vec![
                ("Authorization".into(), format!("Bearer {}", token.expose())),
                ("Accept".into(), self.config.accept.clone()),
                ("X-GitHub-Api-Version".into(), self.config.api_version.clone()),
                ("User-Agent".into(), self.config.user_agent.clone()),
            ],
            body,
        };

        debug!(%method, endpoint, "hosting API call");
        let response = self.transport.send(request).await?;
        debug!(%method, endpoint, status = response.status, "hosting API response");

        interpret(endpoint, response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        token: &Credential,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let value = self.call(token, method, endpoint, body).await?.ok_or_else(|| Error::Decode {
            endpoint: endpoint.to_string(),
            message: "empty response body".to_string(),
        })?;
        serde_json::from_value(value).map_err(|e| Error::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get_repository(&self, token: &Credential, owner: &str, repo: &str) -> Result<Repository> {
        self.fetch(token, Method::Get, &format!("/repos/{owner}/{repo}"), None)
            .await
    }

    pub async fn get_branch(
        &self,
        token: &Credential,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Branch> {
        let endpoint = format!("/repos/{owner}/{repo}/branches/{branch}");
        self.fetch(token, Method::Get, &endpoint, None).await
    }

    pub async fn get_tree_recursive(
        &self,
        token: &Credential,
        owner: &str,
        repo: &str,
        tree_sha: &str,
    ) -> Result<Tree> {
        let endpoint = format!("/repos/{owner}/{repo}/git/trees/{tree_sha}?recursive=1");
        self.fetch(token, Method::Get, &endpoint, None).await
    }

    pub async fn get_blob(&self, token: &Credential, owner: &str, repo: &str, sha: &str) -> Result<Blob> {
        let endpoint = format!("/repos/{owner}/{repo}/git/blobs/{sha}");
        self.fetch(token, Method::Get, &endpoint, None).await
    }

    pub async fn get_commit(
        &self,
        token: &Credential,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<GitCommit> {
        let endpoint = format!("/repos/{owner}/{repo}/git/commits/{sha}");
        self.fetch(token, Method::Get, &endpoint, None).await
    }

    /// Create a blob from already base64-encoded content.
    pub async fn create_blob(
        &self,
        token: &Credential,
        owner: &str,
        repo: &str,
        content_base64: String,
    ) -> Result<ObjectRef> {
        let body = to_body(&NewBlob {
            content: content_base64,
            encoding: "base64",
        })?;
        let endpoint = format!("/repos/{owner}/{repo}/git/blobs");
        self.fetch(token, Method::Post, &endpoint, Some(body)).await
    }

    pub async fn create_tree(
        &self,
        token: &Credential,
        owner: &str,
        repo: &str,
        tree: &NewTree,
    ) -> Result<ObjectRef> {
        let endpoint = format!("/repos/{owner}/{repo}/git/trees");
        self.fetch(token, Method::Post, &endpoint, Some(to_body(tree)?))
            .await
    }

    pub async fn create_commit(
        &self,
        token: &Credential,
        owner: &str,
        repo: &str,
        commit: &NewCommit,
    ) -> Result<ObjectRef> {
        let endpoint = format!("/repos/{owner}/{repo}/git/commits");
        self.fetch(token, Method::Post, &endpoint, Some(to_body(commit)?))
            .await
    }

    /// Move `refs/heads/{branch}` to `sha` without forcing.
    pub async fn update_branch_ref(
        &self,
        token: &Credential,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<()> {
        let body = to_body(&RefUpdate {
            sha: sha.to_string(),
            force: false,
        })?;
        let endpoint = format!("/repos/{owner}/{repo}/git/refs/heads/{branch}");
        self.call(token, Method::Patch, &endpoint, Some(body)).await?;
        Ok(())
    }

    pub async fn get_user(&self, token: &Credential) -> Result<User> {
        self.fetch(token, Method::Get, "/user", None).await
    }

    pub async fn get_user_emails(&self, token: &Credential) -> Result<Vec<UserEmail>> {
        self.fetch(token, Method::Get, "/user/emails", None).await
    }
}

impl fmt::Debug for RemoteObjectClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObjectClient")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::InvalidRequest {
        message: e.to_string(),
    })
}

/// Map a raw response onto the client's result contract.
fn interpret(endpoint: &str, response: HttpResponse) -> Result<Option<Value>> {
    if response.status == 204 {
        return Ok(None);
    }

    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(None);
        }
        return serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| Error::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            });
    }

    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if response.reason.is_empty() {
                format!("HTTP {}", response.status)
            } else {
                response.reason.clone()
            }
        });

    Err(match response.status {
        401 | 403 => Error::Auth {
            status: response.status,
            message,
        },
        404 => Error::NotFound {
            endpoint: endpoint.to_string(),
        },
        429 => Error::RateLimited {
            retry_after: std::time::Duration::from_secs(
                response.retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            ),
        },
        status => Error::Http { status, message },
    })
}
