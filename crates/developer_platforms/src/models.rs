//! # Models
//!
//! This module contains the data models exchanged with the git host and the
//! quality service.
//!
//! These models are designed to be serializable and deserializable so they can
//! be sent to, or decoded from, the Gitea and SonarQube REST APIs directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// A repository on the git host, identified by owner and name.
///
/// # Examples
///
/// ```
/// use gitea_sonarqube_bot_developer_platforms::models::Repository;
///
/// let repo = Repository::new("example-organization", "pr-bot");
/// assert_eq!(repo.to_string(), "example-organization/pr-bot");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    /// The user or organization owning the repository
    pub owner: String,

    /// The name of the repository
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The state of a commit status on the git host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
            CommitState::Failure => "failure",
        }
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit status update handed to the git host.
///
/// This is a value object: it is built for a single reconciliation and never stored.
///
/// # Fields
///
/// * `target_url` - Link shown next to the status, usually the SonarQube dashboard
/// * `description` - Short text shown next to the status, e.g. the quality gate state
/// * `state` - The commit state to report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub target_url: String,
    pub description: String,
    pub state: CommitState,
}

/// A SonarQube pull request analysis as returned by `api/project_pull_requests/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGatePullRequest {
    /// The branch identifier SonarQube uses for the pull request, e.g. `PR-42`
    pub key: String,

    pub status: QualityGatePullRequestStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGatePullRequestStatus {
    #[serde(rename = "qualityGateStatus")]
    pub quality_gate_status: String,
}

/// Response of `api/project_pull_requests/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestsResponse {
    #[serde(default, rename = "pullRequests")]
    pub pull_requests: Vec<QualityGatePullRequest>,
}

impl PullRequestsResponse {
    /// Finds the pull request analysis whose key equals `name`.
    pub fn find(&self, name: &str) -> Option<&QualityGatePullRequest> {
        self.pull_requests.iter().find(|pr| pr.key == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurePeriod {
    pub value: String,
}

/// A single measure of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub metric: String,

    #[serde(default)]
    pub value: String,

    /// Measures on the new code period carry their value here instead of in `value`
    #[serde(default)]
    pub period: Option<MeasurePeriod>,
}

impl Measure {
    pub fn current_value(&self) -> &str {
        match &self.period {
            Some(period) => &period.value,
            None => &self.value,
        }
    }
}

/// Metric metadata used to translate metric keys into display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuresComponent {
    #[serde(default, rename = "pullRequest")]
    pub pull_request: String,

    #[serde(default)]
    pub measures: Vec<Measure>,
}

/// Response of `api/measures/component` with `additionalFields=metrics`.
///
/// # Examples
///
/// ```
/// use gitea_sonarqube_bot_developer_platforms::models::MeasuresResponse;
///
/// let raw = r#"{
///     "component": { "pullRequest": "PR-1", "measures": [ { "metric": "bugs", "value": "3" } ] },
///     "metrics": [ { "key": "bugs", "name": "Bugs" } ]
/// }"#;
/// let measures: MeasuresResponse = serde_json::from_str(raw).unwrap();
///
/// assert!(measures.render_markdown_table().contains("| Bugs | 3 |"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuresResponse {
    pub component: MeasuresComponent,

    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl MeasuresResponse {
    /// Renders the measures as a two column markdown table.
    ///
    /// Metric keys without metadata are shown with their raw key.
    pub fn render_markdown_table(&self) -> String {
        let names: HashMap<&str, &str> = self
            .metrics
            .iter()
            .map(|m| (m.key.as_str(), m.name.as_str()))
            .collect();

        let rows: Vec<String> = self
            .component
            .measures
            .iter()
            .map(|measure| {
                let name = names
                    .get(measure.metric.as_str())
                    .copied()
                    .unwrap_or(measure.metric.as_str());
                format!("| {} | {} |", name, measure.current_value())
            })
            .collect();

        format!(
            "| Metric | Current |\n| -------- | -------- |\n{}",
            rows.join("\n")
        )
    }
}
