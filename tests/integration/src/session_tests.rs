//! End-to-end sessions across the workspace crates
//!
//! Each module drives a [`Workspace`] the way an editor session would:
//! configuration from disk, imports, assistant edits and saves, with the
//! hosting API served by a scripted transport.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sync_core::{
    Assistant, AssistantError, AssistantGateway, AssistantRequest, ErrorKind, OperationKind,
    SaveOptions, SaveOutcome, SourceDescriptor, SyncConfig, Workspace,
};
use sync_fs::{NormalizedPath, RepoFilePath};
use sync_remote::{Credential, Method, RateLimitConfig, RateLimiter};
use sync_test_utils::{FakeHostingRepo, MockResponse, MockTransport, TempProjectDir};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn path(raw: &str) -> RepoFilePath {
    RepoFilePath::parse(raw).unwrap()
}

fn token() -> Credential {
    Credential::new("ghp_sessiontesttoken0000")
}

fn site() -> FakeHostingRepo {
    FakeHostingRepo::new("acme", "site")
        .head("abc123", "tree-abc123")
        .blob("index.html", "<h1>v1</h1>")
        .blob("src/app.js", "start()")
        .identity(
            "octocat",
            Some("Octo Cat"),
            json!([{"email": "octo@example.com", "primary": true, "verified": true}]),
        )
}

fn commit(message: &str) -> SaveOptions {
    SaveOptions {
        token: Some(token()),
        message: Some(message.to_string()),
    }
}

/// Replies with the same canned response every time.
struct CannedAssistant {
    reply: String,
    seen: Mutex<Vec<OperationKind>>,
}

impl CannedAssistant {
    fn new(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: format!("```json\n{reply}\n```"),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Assistant for CannedAssistant {
    async fn complete(&self, request: &AssistantRequest) -> Result<String, AssistantError> {
        self.seen.lock().push(request.kind);
        Ok(self.reply.clone())
    }
}

// =============================================================================
// Configuration drives the limiters
// =============================================================================

mod config_wiring {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn hosting_ceiling_from_config_file_is_enforced() {
        let dir = TempProjectDir::with_files(&[(
            "config.toml",
            "[limits.hosting]\nmax_calls = 5\nwindow_secs = 60\n",
        )]);
        let config = SyncConfig::load(&NormalizedPath::new(dir.root().join("config.toml"))).unwrap();
        assert_eq!(config.limits.hosting, RateLimitConfig::new(5, std::time::Duration::from_secs(60)));

        let mock = MockTransport::new();
        site().install(&mock);
        let workspace = Workspace::new(&config, mock.clone());

        // repository, branch, tree and two blobs
        workspace.import_remote("first", "acme", "site", &token()).await.unwrap();
        assert_eq!(mock.request_count(), 5);

        let err = workspace
            .import_remote("second", "acme", "site", &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.retry_after().is_some());
        assert_eq!(mock.request_count(), 5);
        assert!(workspace.project("second").is_none());
    }
}

// =============================================================================
// Local directory with assistant edits
// =============================================================================

mod local_session {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn refactor_then_flush_to_disk() {
        let dir = TempProjectDir::with_files(&[
            ("src/app.js", "var x = 1"),
            ("README.md", "# app"),
        ]);
        let mock = MockTransport::new();
        let workspace = Workspace::new(&SyncConfig::default(), mock.clone());
        assert_eq!(workspace.import_local("app", dir.root()).unwrap(), 2);

        let assistant = CannedAssistant::new(json!({
            "summary": "use const",
            "files": [
                {"path": "src/app.js", "content": "const x = 1"},
                {"path": "src/util.js", "content": "export {}"}
            ]
        }));
        let gateway = AssistantGateway::new(
            assistant.clone(),
            Arc::new(RateLimiter::new("assistant", RateLimitConfig::new(5, std::time::Duration::from_secs(60)))),
        );
        let project = workspace.project("app").unwrap();
        let output = gateway
            .run(&AssistantRequest {
                kind: OperationKind::Refactor,
                files: project.files().to_vec(),
                user_request: "modernize".into(),
            })
            .await
            .unwrap();

        assert_eq!(workspace.apply_assistant_output("app", output).unwrap(), 2);
        let outcome = workspace.save("app", SaveOptions::default()).await.unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Flushed {
                paths: vec![path("src/app.js"), path("src/util.js")]
            }
        );
        assert_eq!(dir.read("src/app.js"), "const x = 1");
        assert_eq!(dir.read("src/util.js"), "export {}");
        assert_eq!(dir.read("README.md"), "# app");

        assert_eq!(
            workspace.save("app", SaveOptions::default()).await.unwrap(),
            SaveOutcome::Unchanged
        );
        assert_eq!(*assistant.seen.lock(), vec![OperationKind::Refactor]);
        assert_eq!(mock.request_count(), 0);
    }
}

// =============================================================================
// Remote repository round trips
// =============================================================================

mod remote_session {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn consecutive_commits_chain_on_each_other() {
        let mock = MockTransport::new();
        site().install(&mock);
        let workspace = Workspace::new(&SyncConfig::default(), mock.clone());
        workspace.import_remote("site", "acme", "site", &token()).await.unwrap();

        workspace.update_file("site", &path("index.html"), "<h1>v2</h1>").unwrap();
        let first = workspace.save("site", commit("v2")).await.unwrap();
        assert!(matches!(first, SaveOutcome::Committed { ref commit_sha, .. } if commit_sha == "new-commit-1"));

        workspace.update_file("site", &path("src/app.js"), "start(2)").unwrap();
        let second = workspace.save("site", commit("app")).await.unwrap();
        assert!(matches!(second, SaveOutcome::Committed { ref commit_sha, .. } if commit_sha == "new-commit-2"));

        let parents: Vec<Value> = mock
            .requests()
            .iter()
            .filter(|r| r.method == Method::Post && r.endpoint == "/repos/acme/site/git/commits")
            .map(|r| r.body.as_ref().unwrap()["parents"].clone())
            .collect();
        assert_eq!(parents, vec![json!(["abc123"]), json!(["new-commit-1"])]);

        match workspace.project("site").unwrap().source() {
            SourceDescriptor::Remote(remote) => assert_eq!(remote.base_commit_sha, "new-commit-2"),
            other => panic!("expected remote source, got {other:?}"),
        }
        assert!(!workspace.project("site").unwrap().is_dirty());
    }

    #[tokio::test]
    async fn rejected_token_is_not_echoed_back() {
        let mock = MockTransport::new();
        mock.route(
            Method::Get,
            "/repos/acme/site",
            MockResponse::error(401, "Bad credentials for ghp_sessiontesttoken0000"),
        );
        let workspace = Workspace::new(&SyncConfig::default(), mock.clone());

        let err = workspace
            .import_remote("site", "acme", "site", &token())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(!err.to_string().contains("ghp_sessiontesttoken0000"));
        assert!(err.to_string().contains("[REDACTED_TOKEN]"));
    }

    #[tokio::test]
    async fn generated_project_is_memory_only() {
        let mock = MockTransport::new();
        let workspace = Workspace::new(&SyncConfig::default(), mock.clone());
        let assistant = CannedAssistant::new(json!([{"path": "main.py", "content": "print('hi')"}]));
        let gateway = AssistantGateway::new(
            assistant,
            Arc::new(RateLimiter::new("assistant", RateLimitConfig::new(5, std::time::Duration::from_secs(60)))),
        );

        let output = gateway
            .run(&AssistantRequest {
                kind: OperationKind::Generate,
                files: Vec::new(),
                user_request: "hello world in python".into(),
            })
            .await
            .unwrap();
        assert_eq!(workspace.create_generated_project("hello", output).unwrap(), 1);

        assert_eq!(
            workspace.save("hello", commit("ignored")).await.unwrap(),
            SaveOutcome::Ephemeral
        );
        assert!(workspace.project("hello").unwrap().is_dirty());
        assert_eq!(mock.request_count(), 0);
    }
}
