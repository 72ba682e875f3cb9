use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::{ORIGINAL_COMMIT_PROPERTY, SONARQUBE_SOURCE};
use crate::errors::BotError;
use crate::events::decode_json;
use crate::naming::NamingPattern;

#[cfg(test)]
#[path = "quality_analysis_tests.rs"]
mod tests;

/// Kind of branch a SonarQube analysis ran on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchType {
    PullRequest,
    Branch,
    Other(String),
}

impl BranchType {
    /// Interprets the `branch.type` field case-insensitively.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pull_request" => BranchType::PullRequest,
            "branch" => BranchType::Branch,
            _ => BranchType::Other(value.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProject {
    key: String,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    name: String,
    #[serde(rename = "type")]
    branch_type: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawQualityGate {
    status: String,
}

#[derive(Debug, Deserialize)]
struct RawQualityAnalysisWebhook {
    revision: String,
    project: RawProject,
    branch: RawBranch,
    #[serde(rename = "qualityGate")]
    quality_gate: RawQualityGate,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

/// A finished SonarQube analysis, as delivered by the SonarQube webhook.
///
/// The pull request index is derived from the branch name when decoding, so an
/// event that exists always refers to a pull request the bot can address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityAnalysisEvent {
    pub project_key: String,
    pub branch_name: String,
    pub branch_type: BranchType,
    pub branch_url: String,
    pub revision: String,
    pub original_commit: Option<String>,
    pub quality_gate_status: String,
    pub pr_index: u64,
}

impl QualityAnalysisEvent {
    /// Decodes a SonarQube webhook body.
    ///
    /// # Arguments
    ///
    /// * `raw` - The raw request body
    /// * `naming` - The pattern used to derive the pull request index from the branch name
    ///
    /// # Returns
    ///
    /// [`BotError::MalformedBody`] if the JSON is invalid, required fields are
    /// missing, or the branch name is not a pull request branch name.
    pub fn decode(raw: &[u8], naming: &NamingPattern) -> Result<Self, BotError> {
        let webhook: RawQualityAnalysisWebhook = decode_json(raw, SONARQUBE_SOURCE)?;

        let pr_index = naming.parse(&webhook.branch.name).map_err(|e| {
            warn!(
                project = webhook.project.key.as_str(),
                branch = webhook.branch.name.as_str(),
                error = e.to_string(),
                "Error parsing PR index"
            );
            BotError::MalformedBody(e.to_string())
        })?;

        let original_commit = webhook
            .properties
            .get(ORIGINAL_COMMIT_PROPERTY)
            .and_then(|value| value.as_str())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());

        debug!(
            project = webhook.project.key.as_str(),
            branch = webhook.branch.name.as_str(),
            pull_request = pr_index,
            "Decoded SonarQube analysis"
        );

        Ok(Self {
            project_key: webhook.project.key,
            branch_type: BranchType::parse(&webhook.branch.branch_type),
            branch_name: webhook.branch.name,
            branch_url: webhook.branch.url,
            revision: webhook.revision,
            original_commit,
            quality_gate_status: webhook.quality_gate.status,
            pr_index,
        })
    }

    /// The commit the analysis should be reported on.
    ///
    /// Prefers the original commit from the analysis properties, which differs
    /// from `revision` when SonarQube analysed a merge commit.
    pub fn effective_revision(&self) -> &str {
        self.original_commit.as_deref().unwrap_or(&self.revision)
    }

    pub fn is_pull_request_analysis(&self) -> bool {
        self.branch_type == BranchType::PullRequest
    }
}
