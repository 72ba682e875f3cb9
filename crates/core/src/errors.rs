use gitea_sonarqube_bot_developer_platforms::errors::Error as PlatformError;
use thiserror::Error;

use crate::outcome::IgnoreReason;
use crate::signature::SignatureError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("{operation} failed. Issue was: '{source}'.")]
    DownstreamApiError {
        operation: String,
        #[source]
        source: PlatformError,
    },

    #[error("Invalid naming pattern: {0}")]
    InvalidNamingPattern(String),

    #[error("Invalid project mapping: {0}")]
    InvalidProjectMapping(String),

    #[error("Malformed webhook body: {0}")]
    MalformedBody(String),

    #[error("{0}")]
    ProjectNotConfigured(IgnoreReason),

    #[error(transparent)]
    SignatureInvalid(#[from] SignatureError),

    #[error("{0}")]
    UnsupportedEvent(IgnoreReason),
}

impl BotError {
    /// Wraps a collaborator failure with the name of the operation that failed.
    pub fn downstream(operation: &str, source: PlatformError) -> Self {
        BotError::DownstreamApiError {
            operation: operation.to_string(),
            source,
        }
    }
}
