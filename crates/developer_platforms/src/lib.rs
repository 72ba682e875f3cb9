use async_trait::async_trait;

pub mod errors;

pub mod gitea;

pub mod models;

pub mod sonarqube;

use errors::Error;
use models::{CommitStatus, MeasuresResponse, QualityGatePullRequest, Repository};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Trait for the git host that receives commit statuses and pull request comments
/// (e.g. Gitea).
///
/// The bot only needs three narrow capabilities from the git host. Production code
/// uses [`gitea::GiteaProvider`]; tests substitute an in-memory recorder.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use gitea_sonarqube_bot_developer_platforms::{
///     errors::Error,
///     models::{CommitStatus, Repository},
///     GitHostProvider,
/// };
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct LoggingGitHost;
///
/// #[async_trait]
/// impl GitHostProvider for LoggingGitHost {
///     async fn update_commit_status(
///         &self,
///         repo: &Repository,
///         revision: &str,
///         status: &CommitStatus,
///     ) -> Result<(), Error> {
///         println!("{repo}@{revision}: {}", status.state);
///         Ok(())
///     }
///
///     # async fn post_comment(&self, _: &Repository, _: u64, _: &str) -> Result<(), Error> { unimplemented!() }
///     # async fn determine_head_commit(&self, _: &Repository, _: u64) -> Result<String, Error> { unimplemented!() }
/// }
/// ```
#[async_trait]
pub trait GitHostProvider: Send + Sync {
    /// Sets a commit status on the given revision.
    ///
    /// # Arguments
    ///
    /// * `repo` - The repository containing the commit
    /// * `revision` - The full commit SHA
    /// * `status` - The status to attach to the commit
    async fn update_commit_status(
        &self,
        repo: &Repository,
        revision: &str,
        status: &CommitStatus,
    ) -> Result<(), Error>;

    /// Adds a comment to an issue or pull request.
    ///
    /// # Arguments
    ///
    /// * `repo` - The repository containing the pull request
    /// * `issue_number` - The pull request (issue) number
    /// * `body` - The markdown body of the comment
    async fn post_comment(
        &self,
        repo: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<(), Error>;

    /// Looks up the SHA of the current head commit of a pull request.
    ///
    /// # Returns
    ///
    /// A `Result` containing the head commit SHA
    async fn determine_head_commit(&self, repo: &Repository, pr_number: u64)
        -> Result<String, Error>;
}

/// Trait for the code quality service that analyses pull requests (e.g. SonarQube).
///
/// Pull requests are addressed by the branch identifier the quality service uses
/// for them (e.g. `PR-42`), not by the git host's pull request number. Translating
/// between the two is the caller's concern.
#[async_trait]
pub trait QualityGateProvider: Send + Sync {
    /// Loads the configured metrics for a pull request analysis.
    ///
    /// # Arguments
    ///
    /// * `project_key` - The SonarQube project key
    /// * `pull_request` - The SonarQube pull request identifier
    async fn get_measures(
        &self,
        project_key: &str,
        pull_request: &str,
    ) -> Result<MeasuresResponse, Error>;

    /// Loads the current quality gate state of a pull request analysis.
    ///
    /// Returns [`Error::PullRequestNotFound`] if SonarQube has never analysed it.
    async fn get_pull_request(
        &self,
        project_key: &str,
        pull_request: &str,
    ) -> Result<QualityGatePullRequest, Error>;

    /// Builds the dashboard URL for a pull request analysis.
    fn pull_request_url(&self, project_key: &str, pull_request: &str) -> String;
}

/// Maps non-success HTTP statuses onto platform errors.
pub(crate) fn ensure_success(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::AuthError("missing or invalid API token".to_string()));
    }

    if !status.is_success() {
        return Err(Error::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response)
}
