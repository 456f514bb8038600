//! A fake repository on the hosting API, installed onto a [`MockTransport`].
//!
//! Object creation endpoints are content addressed the way the real object
//! store is: the same blob content yields the same blob sha, and the same
//! set of tree entries over the same base yields the same tree sha no matter
//! the order of the entries. Commit shas are always fresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use sync_fs::compute_content_checksum;
use sync_remote::Method;

use crate::transport::{MockResponse, MockTransport};

#[derive(Debug, Clone)]
enum FakeEntry {
    Blob { path: String, sha: String, content: String },
    BrokenBlob { path: String, sha: String },
    Tree { path: String, sha: String },
}

/// Builder for a consistent fake repository.
#[derive(Debug, Clone)]
pub struct FakeHostingRepo {
    owner: String,
    repo: String,
    default_branch: Option<String>,
    branch: String,
    head_sha: String,
    tree_sha: String,
    entries: Vec<FakeEntry>,
    identity: Option<(String, Option<String>, Vec<Value>)>,
}

impl FakeHostingRepo {
    /// A repository whose default branch is `main` at commit `head-sha`.
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            default_branch: Some("main".to_string()),
            branch: "main".to_string(),
            head_sha: "head-sha".to_string(),
            tree_sha: "base-tree-sha".to_string(),
            entries: Vec::new(),
            identity: None,
        }
    }

    pub fn branch(mut self, name: &str) -> Self {
        self.default_branch = Some(name.to_string());
        self.branch = name.to_string();
        self
    }

    /// Omit `default_branch` from the repository metadata.
    pub fn without_default_branch(mut self) -> Self {
        self.default_branch = None;
        self.branch = "main".to_string();
        self
    }

    pub fn head(mut self, commit_sha: &str, tree_sha: &str) -> Self {
        self.head_sha = commit_sha.to_string();
        self.tree_sha = tree_sha.to_string();
        self
    }

    /// A blob entry whose fetch succeeds.
    pub fn blob(mut self, path: &str, content: &str) -> Self {
        let sha = format!("sha-{}", self.entries.len());
        self.entries.push(FakeEntry::Blob {
            path: path.to_string(),
            sha,
            content: content.to_string(),
        });
        self
    }

    /// A blob entry listed in the tree whose fetch fails with a 500.
    pub fn broken_blob(mut self, path: &str) -> Self {
        let sha = format!("sha-{}", self.entries.len());
        self.entries.push(FakeEntry::BrokenBlob {
            path: path.to_string(),
            sha,
        });
        self
    }

    /// A sub-tree entry.
    pub fn dir(mut self, path: &str) -> Self {
        let sha = format!("sha-{}", self.entries.len());
        self.entries.push(FakeEntry::Tree {
            path: path.to_string(),
            sha,
        });
        self
    }

    /// The authenticated user and their email list.
    pub fn identity(mut self, login: &str, name: Option<&str>, emails: Value) -> Self {
        let emails = emails.as_array().cloned().unwrap_or_default();
        self.identity = Some((login.to_string(), name.map(str::to_string), emails));
        self
    }

    pub fn repo_prefix(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }

    pub fn head_sha(&self) -> &str {
        &self.head_sha
    }

    pub fn tree_sha(&self) -> &str {
        &self.tree_sha
    }

    /// Register every route of this repository on `mock`.
    pub fn install(&self, mock: &MockTransport) {
        let prefix = self.repo_prefix();

        let mut metadata = json!({ "name": self.repo, "full_name": format!("{}/{}", self.owner, self.repo) });
        if let Some(branch) = &self.default_branch {
            metadata["default_branch"] = json!(branch);
        }
        mock.route(Method::Get, prefix.clone(), MockResponse::ok(metadata));

        mock.route(
            Method::Get,
            format!("{prefix}/branches/{}", self.branch),
            MockResponse::ok(json!({
                "name": self.branch,
                "commit": {
                    "sha": self.head_sha,
                    "commit": { "tree": { "sha": self.tree_sha } }
                }
            })),
        );

        mock.route(
            Method::Get,
            format!("{prefix}/git/commits/{}", self.head_sha),
            MockResponse::ok(json!({
                "sha": self.head_sha,
                "tree": { "sha": self.tree_sha },
                "parents": []
            })),
        );

        let tree: Vec<Value> = self
            .entries
            .iter()
            .map(|entry| match entry {
                FakeEntry::Blob { path, sha, content } => json!({
                    "path": path, "mode": "100644", "type": "blob", "sha": sha, "size": content.len()
                }),
                FakeEntry::BrokenBlob { path, sha } => json!({
                    "path": path, "mode": "100644", "type": "blob", "sha": sha, "size": 10
                }),
                FakeEntry::Tree { path, sha } => json!({
                    "path": path, "mode": "040000", "type": "tree", "sha": sha
                }),
            })
            .collect();
        mock.route(
            Method::Get,
            format!("{prefix}/git/trees/{}?recursive=1", self.tree_sha),
            MockResponse::ok(json!({ "sha": self.tree_sha, "tree": tree, "truncated": false })),
        );

        for entry in &self.entries {
            match entry {
                FakeEntry::Blob { sha, content, .. } => mock.route(
                    Method::Get,
                    format!("{prefix}/git/blobs/{sha}"),
                    MockResponse::ok(json!({
                        "sha": sha,
                        "encoding": "base64",
                        "content": sync_remote::encode_base64_utf8(content),
                    })),
                ),
                FakeEntry::BrokenBlob { sha, .. } => mock.route(
                    Method::Get,
                    format!("{prefix}/git/blobs/{sha}"),
                    MockResponse::error(500, "Server Error"),
                ),
                FakeEntry::Tree { .. } => {}
            }
        }

        mock.route_fn(Method::Post, format!("{prefix}/git/blobs"), |request| {
            let content = body_str(request.body.as_ref(), "content");
            Ok(MockResponse::created(json!({ "sha": format!("blob-{}", digest(&content)) })))
        });

        mock.route_fn(Method::Post, format!("{prefix}/git/trees"), |request| {
            let body = request.body.clone().unwrap_or(Value::Null);
            let base = body["base_tree"].as_str().unwrap_or_default().to_string();
            let mut entries: Vec<String> = body["tree"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|e| format!("{}={}", e["path"].as_str().unwrap_or_default(), e["sha"].as_str().unwrap_or_default()))
                        .collect()
                })
                .unwrap_or_default();
            entries.sort();
            let sha = format!("tree-{}", digest(&format!("{base}|{}", entries.join(";"))));
            Ok(MockResponse::created(json!({ "sha": sha })))
        });

        let counter = Arc::new(AtomicUsize::new(0));
        mock.route_fn(Method::Post, format!("{prefix}/git/commits"), move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(MockResponse::created(json!({ "sha": format!("new-commit-{n}") })))
        });

        mock.route_fn(
            Method::Patch,
            format!("{prefix}/git/refs/heads/{}", self.branch),
            |request| {
                let sha = body_str(request.body.as_ref(), "sha");
                Ok(MockResponse::ok(json!({ "object": { "sha": sha, "type": "commit" } })))
            },
        );

        if let Some((login, name, emails)) = &self.identity {
            mock.route(
                Method::Get,
                "/user",
                MockResponse::ok(json!({ "login": login, "name": name })),
            );
            mock.route(Method::Get, "/user/emails", MockResponse::ok(Value::Array(emails.clone())));
        }
    }
}

fn body_str(body: Option<&Value>, key: &str) -> String {
    body.and_then(|b| b.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// First 16 hex digits of the content checksum, stable across toolchains.
fn digest(input: &str) -> String {
    let checksum = compute_content_checksum(input);
    let hex = checksum.strip_prefix("sha256:").unwrap_or(&checksum);
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_a_sha256_prefix() {
        assert_eq!(digest(""), "e3b0c44298fc1c14");
        assert_eq!(digest("abc"), "ba7816bf8f01cfea");
        assert_ne!(digest("a"), digest("b"));
    }
}
