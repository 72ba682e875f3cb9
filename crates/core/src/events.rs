//! # Webhook Events
//!
//! Typed decoders for the webhook payloads the bot reacts to.
//!
//! The decoders are organized into submodules:
//! - `quality_analysis`: SonarQube analysis finished for a project branch
//! - `pull_request`: Gitea pull request was opened or received new commits
//! - `issue_comment`: Gitea issue or pull request comment was written
//!
//! Decoding only checks the structure of a payload. Whether the bot acts on an
//! event is decided by the `WebhookHandler`.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::errors::BotError;

pub mod issue_comment;
pub mod pull_request;
pub mod quality_analysis;

pub use issue_comment::{CommentAction, IssueCommentEvent};
pub use pull_request::{PullRequestAction, PullRequestSyncEvent};
pub use quality_analysis::{BranchType, QualityAnalysisEvent};

/// Parses a raw webhook body, turning any structural problem into
/// [`BotError::MalformedBody`].
pub(crate) fn decode_json<T: DeserializeOwned>(raw: &[u8], source: &str) -> Result<T, BotError> {
    serde_json::from_slice(raw).map_err(|e| {
        warn!(source, error = e.to_string(), "Error parsing webhook body");
        BotError::MalformedBody(e.to_string())
    })
}
