//! Assistant collaborator seam
//!
//! The assistant itself is external: anything implementing [`Assistant`]
//! turns a request into raw text. [`AssistantGateway`] rate-limits calls and
//! validates the raw text against the shape expected for the operation kind
//! before any of it reaches a project.

use std::fmt;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use sync_fs::RepoFilePath;
use sync_remote::RateLimiter;
use tracing::debug;

use crate::classify::classify;
use crate::store::File;
use crate::{Result, SyncError};

const CONTEXT: &str = "assistant";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?\s*```\s*$").unwrap());

/// Failures reported by an assistant implementation or by response validation.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Assistant request failed: {0}")]
    Request(String),

    #[error("Assistant quota exhausted: {0}")]
    Quota(String),

    #[error("Malformed assistant response: {0}")]
    Malformed(String),
}

/// What the assistant is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Explain,
    Refactor,
    Debug,
    Generate,
}

impl OperationKind {
    /// Whether the operation works on existing files.
    pub fn needs_files(&self) -> bool {
        !matches!(self, Self::Generate)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Explain => "explain",
            Self::Refactor => "refactor",
            Self::Debug => "debug",
            Self::Generate => "generate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub kind: OperationKind,
    pub files: Vec<File>,
    pub user_request: String,
}

/// A file proposed by the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: RepoFilePath,
    pub content: String,
}

/// A validated assistant response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantOutput {
    Explanation(String),
    Refactor {
        summary: String,
        files: Vec<GeneratedFile>,
    },
    Diagnosis {
        diagnosis: String,
        files: Vec<GeneratedFile>,
    },
    Generated(Vec<GeneratedFile>),
}

impl AssistantOutput {
    pub fn files(&self) -> &[GeneratedFile] {
        match self {
            Self::Explanation(_) => &[],
            Self::Refactor { files, .. } | Self::Diagnosis { files, .. } | Self::Generated(files) => files,
        }
    }

    /// Proposed files as dirty project files.
    pub fn into_files(self) -> Vec<File> {
        match self {
            Self::Explanation(_) => Vec::new(),
            Self::Refactor { files, .. } | Self::Diagnosis { files, .. } | Self::Generated(files) => files
                .into_iter()
                .map(|f| File::dirty(f.path, f.content))
                .collect(),
        }
    }
}

/// The external text-generation collaborator.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Raw response text for `request`.
    async fn complete(&self, request: &AssistantRequest) -> std::result::Result<String, AssistantError>;
}

#[derive(Deserialize)]
struct RawFile {
    path: String,
    content: String,
}

#[derive(Deserialize)]
struct RefactorPayload {
    summary: String,
    files: Vec<RawFile>,
}

#[derive(Deserialize)]
struct DebugPayload {
    diagnosis: String,
    files: Vec<RawFile>,
}

/// Validate a raw response against the shape expected for `kind`.
///
/// JSON payloads may be wrapped in a Markdown code fence.
pub fn parse_response(kind: OperationKind, raw: &str) -> std::result::Result<AssistantOutput, AssistantError> {
    match kind {
        OperationKind::Explain => {
            let text = raw.trim();
            if text.is_empty() {
                return Err(AssistantError::Malformed("empty explanation".into()));
            }
            Ok(AssistantOutput::Explanation(text.to_string()))
        }
        OperationKind::Refactor => {
            let payload: RefactorPayload = from_json(strip_code_fence(raw))?;
            Ok(AssistantOutput::Refactor {
                summary: payload.summary,
                files: validate_files(payload.files)?,
            })
        }
        OperationKind::Debug => {
            let payload: DebugPayload = from_json(strip_code_fence(raw))?;
            Ok(AssistantOutput::Diagnosis {
                diagnosis: payload.diagnosis,
                files: validate_files(payload.files)?,
            })
        }
        OperationKind::Generate => {
            let files: Vec<RawFile> = from_json(strip_code_fence(raw))?;
            if files.is_empty() {
                return Err(AssistantError::Malformed("no files generated".into()));
            }
            Ok(AssistantOutput::Generated(validate_files(files)?))
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    CODE_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw.trim(), |m| m.as_str().trim())
}

fn from_json<'a, T: Deserialize<'a>>(body: &'a str) -> std::result::Result<T, AssistantError> {
    serde_json::from_str(body).map_err(|e| AssistantError::Malformed(e.to_string()))
}

fn validate_files(files: Vec<RawFile>) -> std::result::Result<Vec<GeneratedFile>, AssistantError> {
    files
        .into_iter()
        .map(|raw| {
            let path = RepoFilePath::parse(&raw.path)
                .map_err(|e| AssistantError::Malformed(format!("bad file path: {e}")))?;
            Ok(GeneratedFile {
                path,
                content: raw.content,
            })
        })
        .collect()
}

/// Rate-limited, validating front for an [`Assistant`].
pub struct AssistantGateway {
    assistant: Arc<dyn Assistant>,
    limiter: Arc<RateLimiter>,
}

impl AssistantGateway {
    pub fn new(assistant: Arc<dyn Assistant>, limiter: Arc<RateLimiter>) -> Self {
        Self { assistant, limiter }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub async fn run(&self, request: &AssistantRequest) -> Result<AssistantOutput> {
        if request.user_request.trim().is_empty() {
            return Err(SyncError::validation("Request cannot be empty").with_context(CONTEXT));
        }
        if request.kind.needs_files() && request.files.is_empty() {
            return Err(SyncError::validation(format!("'{}' needs at least one file", request.kind))
                .with_context(CONTEXT));
        }

        self.limiter.try_admit().map_err(|e| classify(&e, Some(CONTEXT)))?;

        debug!(kind = %request.kind, files = request.files.len(), "assistant call");
        let raw = self
            .assistant
            .complete(request)
            .await
            .map_err(|e| classify(&e, Some(CONTEXT)))?;
        parse_response(request.kind, &raw).map_err(|e| classify(&e, Some(CONTEXT)))
    }
}

impl fmt::Debug for AssistantGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantGateway")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn explain_returns_trimmed_text() {
        let output = parse_response(OperationKind::Explain, "  It adds numbers.\n").unwrap();
        assert_eq!(output, AssistantOutput::Explanation("It adds numbers.".into()));
        assert!(output.files().is_empty());
    }

    #[test]
    fn refactor_payload_inside_fence() {
        let raw = "```json\n{\"summary\": \"tidy\", \"files\": [{\"path\": \"src/a.rs\", \"content\": \"fn a() {}\"}]}\n```";
        let output = parse_response(OperationKind::Refactor, raw).unwrap();
        match output {
            AssistantOutput::Refactor { summary, files } => {
                assert_eq!(summary, "tidy");
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].path.as_str(), "src/a.rs");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn generate_produces_dirty_files() {
        let raw = r#"[{"path": "index.html", "content": "<p>hi</p>"}]"#;
        let files = parse_response(OperationKind::Generate, raw).unwrap().into_files();
        assert_eq!(files.len(), 1);
        assert!(files[0].dirty);
    }

    #[rstest]
    #[case(OperationKind::Explain, "   ")]
    #[case(OperationKind::Refactor, r#"{"files": []}"#)]
    #[case(OperationKind::Debug, r#"{"summary": "x", "files": []}"#)]
    #[case(OperationKind::Generate, r#"{"path": "a", "content": "b"}"#)]
    #[case(OperationKind::Generate, "[]")]
    #[case(OperationKind::Generate, r#"[{"path": "../escape", "content": "b"}]"#)]
    #[case(OperationKind::Refactor, "not json at all")]
    fn shape_mismatch_is_malformed(#[case] kind: OperationKind, #[case] raw: &str) {
        assert!(matches!(parse_response(kind, raw), Err(AssistantError::Malformed(_))));
    }

    #[test]
    fn malformed_classifies_as_assistant_service() {
        let err = parse_response(OperationKind::Generate, "[]").unwrap_err();
        assert_eq!(classify(&err, None).kind(), crate::ErrorKind::AssistantService);
    }
}
