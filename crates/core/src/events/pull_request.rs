use gitea_sonarqube_bot_developer_platforms::models::Repository;
use serde::Deserialize;

use crate::config::GITEA_SOURCE;
use crate::errors::BotError;
use crate::events::decode_json;

#[cfg(test)]
#[path = "pull_request_tests.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Synchronized,
    Other(String),
}

impl PullRequestAction {
    pub fn parse(value: &str) -> Self {
        match value {
            "opened" => PullRequestAction::Opened,
            "synchronized" => PullRequestAction::Synchronized,
            _ => PullRequestAction::Other(value.to_string()),
        }
    }

    /// Whether the action introduces new commits that SonarQube will analyse.
    pub fn starts_analysis(&self) -> bool {
        matches!(
            self,
            PullRequestAction::Opened | PullRequestAction::Synchronized
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawHead {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    head: RawHead,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    owner: RawOwner,
}

#[derive(Debug, Deserialize)]
struct RawPullRequestWebhook {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
}

/// A Gitea `pull_request` webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSyncEvent {
    pub action: PullRequestAction,
    pub repository: Repository,
    pub number: u64,
    pub head_sha: String,
}

impl PullRequestSyncEvent {
    pub fn decode(raw: &[u8]) -> Result<Self, BotError> {
        let webhook: RawPullRequestWebhook = decode_json(raw, GITEA_SOURCE)?;

        Ok(Self {
            action: PullRequestAction::parse(&webhook.action),
            repository: Repository::new(webhook.repository.owner.login, webhook.repository.name),
            number: webhook.pull_request.number,
            head_sha: webhook.pull_request.head.sha,
        })
    }
}
