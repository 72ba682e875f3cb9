use super::*;
use std::error::Error as _;

#[test]
fn test_downstream_error_names_operation() {
    let error = BotError::downstream(
        "Updating commit status",
        PlatformError::UnexpectedStatus {
            status: 500,
            url: "https://gitea.example.com/api/v1/repos/o/r/statuses/abc".to_string(),
        },
    );

    assert_eq!(
        error.to_string(),
        "Updating commit status failed. Issue was: 'Unexpected status 500 from https://gitea.example.com/api/v1/repos/o/r/statuses/abc'."
    );
    assert!(error.source().is_some());
}

#[test]
fn test_signature_error_is_transparent() {
    let error = BotError::from(SignatureError::Mismatch("SonarQube".to_string()));

    assert_eq!(
        error.to_string(),
        "Signature header does not match the received SonarQube webhook content. Request rejected."
    );
}

#[test]
fn test_ignore_reasons_display_their_message() {
    let unconfigured = BotError::ProjectNotConfigured(IgnoreReason::UnconfiguredProject(
        "pr-bot".to_string(),
    ));
    let unsupported = BotError::UnsupportedEvent(IgnoreReason::NotAPullRequestAnalysis);

    assert_eq!(
        unconfigured.to_string(),
        "Project 'pr-bot' not in configured list. Request ignored."
    );
    assert_eq!(unsupported.to_string(), "Ignore Hook for non-PR analysis.");
}
