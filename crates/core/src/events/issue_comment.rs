use gitea_sonarqube_bot_developer_platforms::models::Repository;
use serde::Deserialize;

use crate::config::GITEA_SOURCE;
use crate::errors::BotError;
use crate::events::decode_json;

#[cfg(test)]
#[path = "issue_comment_tests.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    Created,
    Other(String),
}

impl CommentAction {
    pub fn parse(value: &str) -> Self {
        match value {
            "created" => CommentAction::Created,
            _ => CommentAction::Other(value.to_string()),
        }
    }
}

// Gitea reports the issue repository with the owner as a plain string.
#[derive(Debug, Deserialize)]
struct RawIssueRepository {
    owner: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    repository: RawIssueRepository,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: String,
}

#[derive(Debug, Deserialize)]
struct RawIssueCommentWebhook {
    action: String,
    #[serde(default)]
    is_pull: bool,
    issue: RawIssue,
    comment: RawComment,
}

/// A Gitea `issue_comment` webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCommentEvent {
    pub action: CommentAction,
    pub is_pull_request: bool,
    pub issue_number: u64,
    pub repository: Repository,
    pub body: String,
}

impl IssueCommentEvent {
    pub fn decode(raw: &[u8]) -> Result<Self, BotError> {
        let webhook: RawIssueCommentWebhook = decode_json(raw, GITEA_SOURCE)?;

        Ok(Self {
            action: CommentAction::parse(&webhook.action),
            is_pull_request: webhook.is_pull,
            issue_number: webhook.issue.number,
            repository: Repository::new(
                webhook.issue.repository.owner,
                webhook.issue.repository.name,
            ),
            body: webhook.comment.body,
        })
    }
}
