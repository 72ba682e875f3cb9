//! Result of handling one inbound webhook.
//!
//! Handling is split in two. Deciding what to do happens synchronously and
//! produces an [`Outcome`] that becomes the HTTP response. The side effects of
//! a processed webhook are described by a [`Reconciliation`] and executed after
//! the response has been written.
use gitea_sonarqube_bot_developer_platforms::models::Repository;
use std::fmt;

use crate::errors::BotError;
use crate::events::QualityAnalysisEvent;
use crate::projects::ProjectMapping;
use crate::signature::SignatureError;

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;

/// Response message for webhooks whose side effects were scheduled
pub const PROCESSING_MESSAGE: &str = "Processing data. See bot logs for details.";

/// Response message for webhooks with an invalid signature
pub const SIGNATURE_REJECTED_MESSAGE: &str = "Webhook validation failed. Request rejected.";

/// Response message for webhooks that cannot be decoded
pub const MALFORMED_BODY_MESSAGE: &str = "Error parsing POST body.";

/// Why a well-formed, authentic webhook does not trigger any side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    UnconfiguredProject(String),
    UnconfiguredRepository(Repository),
    NotAPullRequestAnalysis,
    UnsupportedAction,
    NotAPullRequest,
    NotACreationEvent,
    NotABotCommand,
    UnknownBotCommand,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::UnconfiguredProject(key) => {
                write!(f, "Project '{}' not in configured list. Request ignored.", key)
            }
            IgnoreReason::UnconfiguredRepository(repository) => {
                write!(f, "ignore hook for non-configured project '{}'", repository)
            }
            IgnoreReason::NotAPullRequestAnalysis => f.write_str("Ignore Hook for non-PR analysis."),
            IgnoreReason::UnsupportedAction => {
                f.write_str("ignore hook for action others than 'opened' or 'synchronized'")
            }
            IgnoreReason::NotAPullRequest => f.write_str("ignore non-PR hook"),
            IgnoreReason::NotACreationEvent => {
                f.write_str("ignore hook for action others than created")
            }
            IgnoreReason::NotABotCommand => f.write_str("ignore hook for non-bot action comment"),
            IgnoreReason::UnknownBotCommand => f.write_str("ignore hook for unknown bot command"),
        }
    }
}

/// Why a webhook was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The request could not be read or handled; carries the error text
    InternalError(String),
    SignatureInvalid(SignatureError),
    MalformedBody(String),
}

/// The deferred side effects of a processed webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Report a finished SonarQube analysis on the pull request
    QualityGate {
        project: ProjectMapping,
        event: QualityAnalysisEvent,
    },

    /// Mark the new head commit of a pull request as awaiting analysis
    PendingAnalysis {
        repository: Repository,
        pr_number: u64,
        head_sha: String,
    },

    /// Re-report the current quality gate of a pull request on request
    Review {
        project: ProjectMapping,
        pr_number: u64,
    },
}

/// Result of handling one inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Processed(Reconciliation),
    Ignored(IgnoreReason),
    Rejected(RejectReason),
}

impl Outcome {
    /// HTTP status code reported to the webhook sender.
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::Processed(_) | Outcome::Ignored(_) => 200,
            Outcome::Rejected(RejectReason::InternalError(_)) => 500,
            Outcome::Rejected(RejectReason::SignatureInvalid(_)) => 412,
            Outcome::Rejected(RejectReason::MalformedBody(_)) => 422,
        }
    }

    /// Message reported to the webhook sender.
    pub fn message(&self) -> String {
        match self {
            Outcome::Processed(_) => PROCESSING_MESSAGE.to_string(),
            Outcome::Ignored(reason) => reason.to_string(),
            Outcome::Rejected(RejectReason::InternalError(message)) => message.clone(),
            Outcome::Rejected(RejectReason::SignatureInvalid(_)) => {
                SIGNATURE_REJECTED_MESSAGE.to_string()
            }
            Outcome::Rejected(RejectReason::MalformedBody(_)) => MALFORMED_BODY_MESSAGE.to_string(),
        }
    }

    /// The side effects to run after responding, if any.
    pub fn into_reconciliation(self) -> Option<Reconciliation> {
        match self {
            Outcome::Processed(work) => Some(work),
            _ => None,
        }
    }
}

impl From<Result<Reconciliation, BotError>> for Outcome {
    fn from(result: Result<Reconciliation, BotError>) -> Self {
        match result {
            Ok(work) => Outcome::Processed(work),
            Err(BotError::ProjectNotConfigured(reason)) | Err(BotError::UnsupportedEvent(reason)) => {
                Outcome::Ignored(reason)
            }
            Err(BotError::SignatureInvalid(e)) => {
                Outcome::Rejected(RejectReason::SignatureInvalid(e))
            }
            Err(BotError::MalformedBody(e)) => Outcome::Rejected(RejectReason::MalformedBody(e)),
            Err(e) => Outcome::Rejected(RejectReason::InternalError(e.to_string())),
        }
    }
}
