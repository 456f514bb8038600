//! Tests for the assistant gateway

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sync_core::{
    Assistant, AssistantError, AssistantGateway, AssistantOutput, AssistantRequest, ErrorKind,
    File, OperationKind,
};
use sync_fs::RepoFilePath;
use sync_remote::{RateLimitConfig, RateLimiter};
use sync_test_utils::ManualClock;

/// Replies with queued responses, counting calls.
#[derive(Default)]
struct ScriptedAssistant {
    replies: Mutex<Vec<Result<String, AssistantError>>>,
    calls: Mutex<usize>,
}

impl ScriptedAssistant {
    fn replying(replies: Vec<Result<String, AssistantError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn complete(&self, _request: &AssistantRequest) -> Result<String, AssistantError> {
        *self.calls.lock() += 1;
        let mut replies = self.replies.lock();
        if replies.is_empty() {
            return Err(AssistantError::Request("no scripted reply".into()));
        }
        replies.remove(0)
    }
}

fn limiter(max_calls: usize, clock: Arc<ManualClock>) -> Arc<RateLimiter> {
    Arc::new(RateLimiter::with_clock(
        "assistant",
        RateLimitConfig::new(max_calls, Duration::from_secs(60)),
        clock,
    ))
}

fn generate(request: &str) -> AssistantRequest {
    AssistantRequest {
        kind: OperationKind::Generate,
        files: Vec::new(),
        user_request: request.to_string(),
    }
}

#[tokio::test]
async fn test_generate_returns_validated_files() {
    let assistant = ScriptedAssistant::replying(vec![Ok(
        "```json\n[{\"path\": \"index.html\", \"content\": \"<p>hi</p>\"}]\n```".into(),
    )]);
    let gateway = AssistantGateway::new(assistant, limiter(10, ManualClock::new()));

    let output = gateway.run(&generate("a landing page")).await.unwrap();
    match output {
        AssistantOutput::Generated(files) => {
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].path.as_str(), "index.html");
        }
        other => panic!("unexpected output: {other:?}"),
    }
}

#[tokio::test]
async fn test_limiter_refusal_skips_assistant() {
    let clock = ManualClock::new();
    let assistant = ScriptedAssistant::replying(vec![
        Ok(r#"[{"path": "a.txt", "content": "a"}]"#.into()),
        Ok(r#"[{"path": "b.txt", "content": "b"}]"#.into()),
    ]);
    let gateway = AssistantGateway::new(assistant.clone(), limiter(1, clock.clone()));

    gateway.run(&generate("first")).await.unwrap();
    let err = gateway.run(&generate("second")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(err.retry_after().is_some());
    assert_eq!(assistant.calls(), 1);

    clock.advance(Duration::from_secs(60));
    gateway.run(&generate("third")).await.unwrap();
    assert_eq!(assistant.calls(), 2);
}

#[tokio::test]
async fn test_assistant_failures_are_classified() {
    let assistant = ScriptedAssistant::replying(vec![
        Err(AssistantError::Quota("daily limit".into())),
        Err(AssistantError::Request("upstream 500".into())),
        Ok("{\"not\": \"a list\"}".into()),
    ]);
    let gateway = AssistantGateway::new(assistant, limiter(10, ManualClock::new()));

    let quota = gateway.run(&generate("one")).await.unwrap_err();
    assert_eq!(quota.kind(), ErrorKind::RateLimited);

    let failed = gateway.run(&generate("two")).await.unwrap_err();
    assert_eq!(failed.kind(), ErrorKind::AssistantService);

    let malformed = gateway.run(&generate("three")).await.unwrap_err();
    assert_eq!(malformed.kind(), ErrorKind::AssistantService);
    assert_eq!(malformed.context(), Some("assistant"));
}

#[tokio::test]
async fn test_invalid_requests_never_reach_assistant() {
    let assistant = ScriptedAssistant::replying(Vec::new());
    let gateway = AssistantGateway::new(assistant.clone(), limiter(10, ManualClock::new()));

    let blank = gateway.run(&generate("   ")).await.unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::Validation);

    let refactor = AssistantRequest {
        kind: OperationKind::Refactor,
        files: Vec::new(),
        user_request: "clean it up".into(),
    };
    let no_files = gateway.run(&refactor).await.unwrap_err();
    assert_eq!(no_files.kind(), ErrorKind::Validation);

    assert_eq!(assistant.calls(), 0);
    assert_eq!(gateway.limiter().in_window(), 0);
}

#[tokio::test]
async fn test_debug_returns_diagnosis_and_fixes() {
    let assistant = ScriptedAssistant::replying(vec![Ok(
        r#"{"diagnosis": "off by one", "files": [{"path": "src/lib.rs", "content": "fixed"}]}"#.into(),
    )]);
    let gateway = AssistantGateway::new(assistant, limiter(10, ManualClock::new()));
    let request = AssistantRequest {
        kind: OperationKind::Debug,
        files: vec![File::clean(RepoFilePath::parse("src/lib.rs").unwrap(), "broken")],
        user_request: "why does it crash".into(),
    };

    let output = gateway.run(&request).await.unwrap();
    match &output {
        AssistantOutput::Diagnosis { diagnosis, files } => {
            assert_eq!(diagnosis, "off by one");
            assert_eq!(files[0].content, "fixed");
        }
        other => panic!("unexpected output: {other:?}"),
    }
    assert!(output.into_files().iter().all(|f| f.dirty));
}
