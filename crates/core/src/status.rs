//! Translation of quality gate results into Gitea commit statuses.
use gitea_sonarqube_bot_developer_platforms::models::{CommitState, CommitStatus};

use crate::config::{PENDING_STATUS_DESCRIPTION, QUALITY_GATE_OK};

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

/// Builds the commit status reporting a quality gate result.
///
/// Only the `OK` gate status counts as success; every other value, including
/// `WARN` and `NONE`, is reported as failure. The description carries the raw
/// gate status.
pub fn from_quality_gate(quality_gate_status: &str, target_url: &str) -> CommitStatus {
    let state = if quality_gate_status == QUALITY_GATE_OK {
        CommitState::Success
    } else {
        CommitState::Failure
    };

    CommitStatus {
        target_url: target_url.to_string(),
        description: quality_gate_status.to_string(),
        state,
    }
}

/// Builds the commit status shown while SonarQube has not reported yet.
pub fn pending() -> CommitStatus {
    CommitStatus {
        target_url: String::new(),
        description: PENDING_STATUS_DESCRIPTION.to_string(),
        state: CommitState::Pending,
    }
}
