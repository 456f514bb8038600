//! Tests for save orchestration across project sources

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use sync_core::{
    AssistantOutput, ErrorKind, GeneratedFile, SaveOptions, SaveOutcome, SourceDescriptor,
    SyncConfig, Workspace,
};
use sync_fs::RepoFilePath;
use sync_remote::{Credential, Method};
use sync_test_utils::{FakeHostingRepo, MockResponse, MockTransport, TempProjectDir};

fn path(raw: &str) -> RepoFilePath {
    RepoFilePath::parse(raw).unwrap()
}

fn token() -> Credential {
    Credential::new("ghp_workspacetesttoken")
}

fn fake() -> FakeHostingRepo {
    FakeHostingRepo::new("acme", "site")
        .head("abc123", "tree-abc123")
        .blob("index.html", "<h1>v1</h1>")
        .blob("style.css", "body {}")
        .identity(
            "octocat",
            Some("Octo Cat"),
            json!([{"email": "octo@example.com", "primary": true, "verified": true}]),
        )
}

fn workspace_with(mock: &Arc<MockTransport>) -> Workspace {
    Workspace::new(&SyncConfig::default(), mock.clone())
}

fn commit_options(message: &str) -> SaveOptions {
    SaveOptions {
        token: Some(token()),
        message: Some(message.to_string()),
    }
}

#[tokio::test]
async fn test_memory_save_is_ephemeral_and_keeps_flags() {
    let mock = MockTransport::new();
    let workspace = workspace_with(&mock);
    workspace
        .create_project("scratch", Some(vec![(path("notes.md"), "draft".into())]))
        .unwrap();

    let outcome = workspace.save("scratch", SaveOptions::default()).await.unwrap();

    assert_eq!(outcome, SaveOutcome::Ephemeral);
    assert!(workspace.project("scratch").unwrap().is_dirty());
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_local_import_edit_and_flush() {
    let dir = TempProjectDir::with_files(&[
        ("index.html", "<p>home</p>"),
        ("src/app.js", "run()"),
        (".git/config", "[core]"),
        ("node_modules/lib/index.js", "x"),
        ("logo.png", "binary-ish"),
    ]);
    let workspace = workspace_with(&MockTransport::new());

    let count = workspace.import_local("site", dir.root()).unwrap();
    assert_eq!(count, 2);
    let project = workspace.project("site").unwrap();
    assert!(matches!(project.source(), SourceDescriptor::Local(_)));
    assert!(!project.is_dirty());

    workspace.update_file("site", &path("src/app.js"), "run(true)").unwrap();
    workspace.update_file("site", &path("docs/new.md"), "# new").unwrap();

    let outcome = workspace.save("site", SaveOptions::default()).await.unwrap();
    match outcome {
        SaveOutcome::Flushed { paths } => assert_eq!(paths.len(), 2),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(dir.read("src/app.js"), "run(true)");
    assert_eq!(dir.read("docs/new.md"), "# new");
    assert!(!workspace.project("site").unwrap().is_dirty());

    let again = workspace.save("site", SaveOptions::default()).await.unwrap();
    assert_eq!(again, SaveOutcome::Unchanged);
}

#[tokio::test]
async fn test_local_import_of_missing_directory_is_storage_error() {
    let dir = TempProjectDir::new();
    let workspace = workspace_with(&MockTransport::new());

    let err = workspace
        .import_local("site", dir.root().join("missing"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(workspace.project("site").is_none());
}

#[tokio::test]
async fn test_remote_import_edit_and_commit() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);

    let source = workspace.import_remote("site", "acme", "site", &token()).await.unwrap();
    assert_eq!(source.base_commit_sha, "abc123");
    assert_eq!(workspace.project("site").unwrap().files().len(), 2);

    workspace.update_file("site", &path("index.html"), "<h1>v2</h1>").unwrap();
    let outcome = workspace.save("site", commit_options("Bump heading")).await.unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Committed {
            commit_sha: "new-commit-1".into(),
            paths: vec![path("index.html")],
        }
    );
    let project = workspace.project("site").unwrap();
    assert!(!project.is_dirty());
    match project.source() {
        SourceDescriptor::Remote(remote) => assert_eq!(remote.base_commit_sha, "new-commit-1"),
        other => panic!("unexpected source: {other:?}"),
    }
    assert_eq!(mock.count(Method::Get, "/user"), 2);
    assert_eq!(mock.count(Method::Post, "/repos/acme/site/git/blobs"), 1);
}

#[tokio::test]
async fn test_remote_save_without_message_makes_no_calls() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);
    workspace.import_remote("site", "acme", "site", &token()).await.unwrap();
    workspace.update_file("site", &path("index.html"), "changed").unwrap();
    let before = mock.request_count();

    let err = workspace
        .save(
            "site",
            SaveOptions {
                token: Some(token()),
                message: None,
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(mock.request_count(), before);
    assert!(workspace.project("site").unwrap().is_dirty());
}

#[tokio::test]
async fn test_failed_commit_keeps_files_dirty_and_anchor() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);
    workspace.import_remote("site", "acme", "site", &token()).await.unwrap();
    workspace.update_file("site", &path("index.html"), "changed").unwrap();
    mock.route(
        Method::Patch,
        "/repos/acme/site/git/refs/heads/main",
        MockResponse::error(422, "Update is not a fast forward"),
    );

    let err = workspace.save("site", commit_options("Try")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteService);
    let project = workspace.project("site").unwrap();
    assert!(project.is_dirty());
    match project.source() {
        SourceDescriptor::Remote(remote) => assert_eq!(remote.base_commit_sha, "abc123"),
        other => panic!("unexpected source: {other:?}"),
    }
}

#[tokio::test]
async fn test_edit_during_commit_stays_dirty() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);
    workspace.import_remote("site", "acme", "site", &token()).await.unwrap();
    workspace.update_file("site", &path("index.html"), "committed").unwrap();

    // Simulate an edit landing while the commit request is in flight
    let store = Arc::clone(workspace.store());
    mock.route_fn(Method::Post, "/repos/acme/site/git/commits", move |_| {
        store
            .write()
            .update_file("site", &RepoFilePath::parse("index.html").unwrap(), "edited meanwhile")
            .unwrap();
        Ok(MockResponse::created(json!({ "sha": "mid-flight-commit" })))
    });

    workspace.save("site", commit_options("Race")).await.unwrap();

    let project = workspace.project("site").unwrap();
    let file = project.file(&path("index.html")).unwrap();
    assert_eq!(file.content, "edited meanwhile");
    assert!(file.dirty);
}

#[tokio::test]
async fn test_reimport_replaces_files_and_anchor() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);
    workspace.import_remote("site", "acme", "site", &token()).await.unwrap();
    workspace.update_file("site", &path("scratch.txt"), "local only").unwrap();

    FakeHostingRepo::new("acme", "site")
        .head("def456", "tree-def456")
        .blob("index.html", "<h1>upstream</h1>")
        .install(&mock);
    let source = workspace.reimport_remote("site", &token()).await.unwrap();

    assert_eq!(source.base_commit_sha, "def456");
    let project = workspace.project("site").unwrap();
    let paths: Vec<&str> = project.files().iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["index.html", "scratch.txt"]);
    assert_eq!(project.files()[0].content, "<h1>upstream</h1>");
    assert!(!project.files()[0].dirty);
    // the unsaved local file is carried over, still pending
    assert!(project.files()[1].dirty);
}

#[tokio::test]
async fn test_reimport_after_rejected_commit_keeps_edits_for_retry() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);
    workspace.import_remote("site", "acme", "site", &token()).await.unwrap();
    workspace.update_file("site", &path("index.html"), "<h1>mine</h1>").unwrap();
    workspace.update_file("site", &path("style.css"), "body {}").unwrap();
    mock.route(
        Method::Patch,
        "/repos/acme/site/git/refs/heads/main",
        MockResponse::error(422, "Update is not a fast forward"),
    );

    let err = workspace.save("site", commit_options("Mine")).await.unwrap_err();
    assert!(err.message().contains("re-import"));

    // someone else moved the branch; follow the hint
    FakeHostingRepo::new("acme", "site")
        .head("def456", "tree-def456")
        .blob("index.html", "<h1>theirs</h1>")
        .blob("style.css", "body {}")
        .identity(
            "octocat",
            Some("Octo Cat"),
            json!([{"email": "octo@example.com", "primary": true, "verified": true}]),
        )
        .install(&mock);
    workspace.reimport_remote("site", &token()).await.unwrap();

    let project = workspace.project("site").unwrap();
    let index = project.file(&path("index.html")).unwrap();
    assert_eq!(index.content, "<h1>mine</h1>");
    assert!(index.dirty);
    // rewritten with identical content, nothing left to commit
    assert!(!project.file(&path("style.css")).unwrap().dirty);

    let outcome = workspace.save("site", commit_options("Mine again")).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Committed { ref paths, .. } if paths == &vec![path("index.html")]));
    let parents: Vec<_> = mock
        .requests()
        .iter()
        .filter(|r| r.method == Method::Post && r.endpoint == "/repos/acme/site/git/commits")
        .map(|r| r.body.as_ref().unwrap()["parents"].clone())
        .collect();
    assert_eq!(parents.last().unwrap(), &json!(["def456"]));
    assert!(!workspace.project("site").unwrap().is_dirty());
}

#[tokio::test]
async fn test_incomplete_import_is_not_installed() {
    let mock = MockTransport::new();
    FakeHostingRepo::new("acme", "site")
        .blob("index.html", "<h1>v1</h1>")
        .broken_blob("app.js")
        .install(&mock);
    let workspace = workspace_with(&mock);

    let err = workspace
        .import_remote("site", "acme", "site", &token())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteService);
    assert!(err.message().contains("app.js"));
    assert!(workspace.project("site").is_none());
}

#[tokio::test]
async fn test_incomplete_reimport_keeps_project_untouched() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);
    workspace.import_remote("site", "acme", "site", &token()).await.unwrap();
    workspace.update_file("site", &path("index.html"), "<h1>mine</h1>").unwrap();

    FakeHostingRepo::new("acme", "site")
        .head("def456", "tree-def456")
        .blob("index.html", "<h1>theirs</h1>")
        .broken_blob("style.css")
        .install(&mock);
    let err = workspace.reimport_remote("site", &token()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteService);

    let project = workspace.project("site").unwrap();
    match project.source() {
        SourceDescriptor::Remote(remote) => assert_eq!(remote.base_commit_sha, "abc123"),
        other => panic!("expected remote source, got {other:?}"),
    }
    assert_eq!(project.files().len(), 2);
    assert_eq!(project.file(&path("index.html")).unwrap().content, "<h1>mine</h1>");
}

#[tokio::test]
async fn test_reimport_of_memory_project_is_validation() {
    let workspace = workspace_with(&MockTransport::new());
    workspace.create_project("scratch", None).unwrap();

    let err = workspace.reimport_remote("scratch", &token()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_import_into_taken_name_makes_no_calls() {
    let mock = MockTransport::new();
    fake().install(&mock);
    let workspace = workspace_with(&mock);
    workspace.create_project("site", None).unwrap();

    let err = workspace
        .import_remote("site", "acme", "site", &token())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(mock.request_count(), 0);
}

#[test]
fn test_assistant_output_merges_and_generates() {
    let workspace = workspace_with(&MockTransport::new());
    workspace
        .create_project(
            "app",
            Some(vec![(path("a.js"), "old".into()), (path("b.js"), "keep".into())]),
        )
        .unwrap();
    workspace.store().write().mark_clean("app", None).unwrap();

    let applied = workspace
        .apply_assistant_output(
            "app",
            AssistantOutput::Refactor {
                summary: "tidy".into(),
                files: vec![GeneratedFile {
                    path: path("a.js"),
                    content: "new".into(),
                }],
            },
        )
        .unwrap();
    assert_eq!(applied, 1);
    let project = workspace.project("app").unwrap();
    assert_eq!(project.file(&path("a.js")).unwrap().content, "new");
    assert!(project.file(&path("a.js")).unwrap().dirty);
    assert!(!project.file(&path("b.js")).unwrap().dirty);

    let created = workspace
        .create_generated_project(
            "generated",
            AssistantOutput::Generated(vec![GeneratedFile {
                path: path("index.html"),
                content: "<p>hi</p>".into(),
            }]),
        )
        .unwrap();
    assert_eq!(created, 1);
    assert_eq!(
        workspace.project("generated").unwrap().source(),
        &SourceDescriptor::Memory
    );

    let err = workspace
        .create_generated_project("empty", AssistantOutput::Explanation("text".into()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
