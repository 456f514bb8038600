use proptest::prelude::*;
use rstest::rstest;
use sync_fs::RepoFilePath;

#[rstest]
#[case("")]
#[case("/etc/passwd")]
#[case("../secret.txt")]
#[case("src/../../escape.rs")]
#[case("src//main.rs")]
#[case("./main.rs")]
#[case("src/")]
fn test_rejects_invalid_paths(#[case] raw: &str) {
    let result = RepoFilePath::parse(raw);
    assert!(result.is_err(), "expected '{}' to be rejected", raw);
}

#[rstest]
#[case("main.rs")]
#[case("src/lib.rs")]
#[case(".github/workflows/ci.yml")]
#[case("docs/café.md")]
#[case("a..b/c.txt")]
fn test_accepts_valid_paths(#[case] raw: &str) {
    let path = RepoFilePath::parse(raw).unwrap();
    assert_eq!(path.as_str(), raw);
}

#[test]
fn test_invalid_path_error_mentions_reason() {
    let err = RepoFilePath::parse("../x").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("../x"));
    assert!(message.contains(".."));
}

#[test]
fn test_serde_rejects_invalid_path() {
    let ok: RepoFilePath = serde_json::from_str("\"src/app.ts\"").unwrap();
    assert_eq!(ok.as_str(), "src/app.ts");

    let bad: Result<RepoFilePath, _> = serde_json::from_str("\"/abs\"");
    assert!(bad.is_err());
}

proptest! {
    #[test]
    fn test_parsed_paths_hold_invariants(s in "[a-zA-Z0-9_./\\\\-]{1,40}") {
        if let Ok(path) = RepoFilePath::parse(&s) {
            let as_str = path.as_str();
            prop_assert!(!as_str.is_empty());
            prop_assert!(!as_str.starts_with('/'));
            prop_assert!(!as_str.contains('\\'));
            prop_assert!(as_str.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != ".."));
        }
    }
}
