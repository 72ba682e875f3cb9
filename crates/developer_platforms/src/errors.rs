#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for developer platform operations.
///
/// This enum represents the failures that can occur when talking to the git host
/// (Gitea) or the quality service (SonarQube). None of these are retried by the bot;
/// they are logged by the caller and the remaining side effects of the current
/// reconciliation are abandoned.
///
/// # Examples
///
/// ```rust
/// use gitea_sonarqube_bot_developer_platforms::errors::Error;
///
/// let auth_error = Error::AuthError("missing or invalid API token".to_string());
/// assert_eq!(
///     auth_error.to_string(),
///     "Authentication failed: missing or invalid API token"
/// );
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Authentication failed with the platform.
    ///
    /// The configured token is missing, expired, or lacks the permissions for
    /// the requested operation.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Failed to update pull request.
    ///
    /// Posting a comment or setting a commit status was refused by the git host.
    /// The string parameter contains specific details about what operation failed.
    #[error("Failed to update the PR: {0}")]
    FailedToUpdatePullRequest(String),

    /// Invalid response format from platform API.
    ///
    /// The response body could not be decoded into the expected structure.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The quality service has no pull request analysis with the given name.
    #[error("No pull request found with name '{0}'")]
    PullRequestNotFound(String),

    /// The HTTP request could not be sent or no response was received.
    #[error("Request to {0} failed: {1}")]
    RequestFailed(String, String),

    /// The platform answered with a status code the client does not handle.
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}
