use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::{debug, error, info, instrument};

use crate::{
    ensure_success,
    errors::Error,
    models::{CommitStatus, Repository},
    GitHostProvider,
};

#[cfg(test)]
#[path = "gitea_tests.rs"]
mod tests;

/// Context name under which commit statuses are reported unless configured otherwise.
pub const DEFAULT_STATUS_CONTEXT: &str = "gitea-sonarqube-bot";

#[derive(Debug, Deserialize)]
struct PullRequestHead {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    head: PullRequestHead,
}

/// [`GitHostProvider`] backed by the Gitea REST API (v1).
///
/// Requests are authenticated with an access token sent as `Authorization: token <value>`.
///
/// # Example
///
/// ```rust,no_run
/// use gitea_sonarqube_bot_developer_platforms::{gitea::GiteaProvider, models::Repository, GitHostProvider};
///
/// # async fn example() -> Result<(), gitea_sonarqube_bot_developer_platforms::errors::Error> {
/// let gitea = GiteaProvider::new("https://gitea.example.com", "d0fcdeb5eaa99c506831f9eb4e63fc7cc484a565");
/// let head = gitea
///     .determine_head_commit(&Repository::new("example-organization", "pr-bot"), 42)
///     .await?;
/// println!("PR #42 is at {head}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GiteaProvider {
    client: Client,
    base_url: String,
    token: String,
    status_context: String,
}

impl GiteaProvider {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            status_context: DEFAULT_STATUS_CONTEXT.to_string(),
        }
    }

    /// Overrides the context name commit statuses are reported under.
    pub fn with_status_context(mut self, status_context: &str) -> Self {
        self.status_context = status_context.to_string();
        self
    }

    fn repo_url(&self, repo: &Repository, path: &str) -> String {
        format!(
            "{}/api/v1/repos/{}/{}{}",
            self.base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            path
        )
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }
}

impl fmt::Debug for GiteaProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiteaProvider")
            .field("base_url", &self.base_url)
            .field("status_context", &self.status_context)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GitHostProvider for GiteaProvider {
    #[instrument(skip(status))]
    async fn update_commit_status(
        &self,
        repo: &Repository,
        revision: &str,
        status: &CommitStatus,
    ) -> Result<(), Error> {
        let url = self.repo_url(repo, &format!("/statuses/{}", revision));
        let payload = json!({
            "context": self.status_context,
            "description": status.description,
            "state": status.state,
            "target_url": status.target_url,
        });

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::RequestFailed(url.clone(), e.to_string()))?;

        ensure_success(response, &url).map_err(|e| {
            error!(
                repository_owner = repo.owner.as_str(),
                repository = repo.name.as_str(),
                revision,
                error = e.to_string(),
                "Failed to update commit status"
            );
            e
        })?;

        info!(
            repository_owner = repo.owner.as_str(),
            repository = repo.name.as_str(),
            revision,
            state = status.state.as_str(),
            "Updated commit status"
        );
        Ok(())
    }

    #[instrument(skip(body))]
    async fn post_comment(
        &self,
        repo: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<(), Error> {
        let url = self.repo_url(repo, &format!("/issues/{}/comments", issue_number));

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(|e| Error::RequestFailed(url.clone(), e.to_string()))?;

        match ensure_success(response, &url) {
            Ok(_) => {
                info!(
                    repository_owner = repo.owner.as_str(),
                    repository = repo.name.as_str(),
                    pull_request = issue_number,
                    "Posted pull request comment"
                );
                Ok(())
            }
            Err(Error::AuthError(message)) => Err(Error::AuthError(message)),
            Err(e) => Err(Error::FailedToUpdatePullRequest(format!(
                "Failed to add comment: {}",
                e
            ))),
        }
    }

    #[instrument]
    async fn determine_head_commit(
        &self,
        repo: &Repository,
        pr_number: u64,
    ) -> Result<String, Error> {
        let url = self.repo_url(repo, &format!("/pulls/{}", pr_number));

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(|e| Error::RequestFailed(url.clone(), e.to_string()))?;
        let response = ensure_success(response, &url)?;

        let pr: PullRequestResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        debug!(
            repository_owner = repo.owner.as_str(),
            repository = repo.name.as_str(),
            pull_request = pr_number,
            head = pr.head.sha.as_str(),
            "Determined pull request head"
        );
        Ok(pr.head.sha)
    }
}
