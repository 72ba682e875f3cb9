use super::*;
use crate::projects::{ProjectMapping, ProjectResolver};
use proptest::prelude::*;

#[test]
fn test_default_branch_pattern_matches_pull_request_branches() {
    let captures = DEFAULT_BRANCH_PATTERN
        .captures("PR-1337")
        .expect("PR-1337 should match");

    assert_eq!(&captures[1], "1337");
}

#[test]
fn test_default_branch_pattern_rejects_other_branches() {
    let branches = vec!["main", "feature/PR-1", "PR-", "PR-12a", "pr-12"];

    for branch in branches {
        assert!(
            !DEFAULT_BRANCH_PATTERN.is_match(branch),
            "DEFAULT_BRANCH_PATTERN should not match '{}'",
            branch
        );
    }
}

proptest! {
    #[test]
    fn test_default_branch_pattern_random_inputs(input in ".*") {
        let _ = DEFAULT_BRANCH_PATTERN.is_match(&input);
    }
}

#[test]
fn test_pending_status_description() {
    assert_eq!(PENDING_STATUS_DESCRIPTION, "Analysis pending...");
}

#[test]
fn test_webhook_secrets_debug_hides_values() {
    let secrets = WebhookSecrets {
        gitea: "gitea-secret".to_string(),
        sonarqube: String::new(),
    };

    let debug = format!("{:?}", secrets);

    assert!(!debug.contains("gitea-secret"));
    assert!(debug.contains("<redacted>"));
    assert!(debug.contains("<unset>"));
}

#[test]
fn test_bot_settings_new() {
    let projects = ProjectResolver::new(vec![ProjectMapping::new("pr-bot", "some-owner", "a-repository")])
        .expect("single mapping is valid");

    let settings = BotSettings::new(projects, NamingPattern::default(), WebhookSecrets::default());

    assert_eq!(settings.projects.len(), 1);
    assert_eq!(settings.naming.format(42), "PR-42");
    assert!(settings.secrets.gitea.is_empty());
}
