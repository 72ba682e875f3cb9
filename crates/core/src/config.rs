//! Configuration settings for the bot's core functionality.
//!
//! This module centralizes the constants that shape the bot's externally visible
//! behaviour and the immutable [`BotSettings`] shared by all request handlers.
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::naming::NamingPattern;
use crate::projects::ProjectResolver;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Default regular expression identifying pull request branches in SonarQube
pub const DEFAULT_BRANCH_REGEX: &str = r"^PR-(\d+)$";

/// Default template turning a pull request index into a SonarQube branch name
pub const DEFAULT_BRANCH_TEMPLATE: &str = "PR-%d";

/// Placeholder in the branch template that is replaced by the pull request index
pub const INDEX_PLACEHOLDER: &str = "%d";

/// Analysis property holding the commit that was actually analysed when SonarQube
/// reports a merge commit as revision
pub const ORIGINAL_COMMIT_PROPERTY: &str = "sonar.analysis.sqbot";

/// Description of the commit status set while an analysis is outstanding
pub const PENDING_STATUS_DESCRIPTION: &str = "Analysis pending...";

/// Quality gate status reported by SonarQube for a passing analysis
pub const QUALITY_GATE_OK: &str = "OK";

/// Webhook source name used in signature error messages
pub const GITEA_SOURCE: &str = "Gitea";

/// Webhook source name used in signature error messages
pub const SONARQUBE_SOURCE: &str = "SonarQube";

lazy_static! {
    /// Pre-compiled default pull request branch regex
    pub static ref DEFAULT_BRANCH_PATTERN: Regex = Regex::new(DEFAULT_BRANCH_REGEX)
        .expect("Failed to compile default branch name regex");
}

/// Shared secrets used to authenticate inbound webhooks. An empty secret means the
/// source is not expected to sign its requests.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WebhookSecrets {
    pub gitea: String,
    pub sonarqube: String,
}

impl fmt::Debug for WebhookSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSecrets")
            .field("gitea", &redact(&self.gitea))
            .field("sonarqube", &redact(&self.sonarqube))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Immutable runtime settings of the bot.
///
/// Built once at startup from the loaded configuration and shared between all
/// concurrently running request handlers.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// The configured SonarQube project to Gitea repository mappings
    pub projects: ProjectResolver,

    /// Translation between pull request indexes and SonarQube branch names
    pub naming: NamingPattern,

    /// Secrets for verifying webhook signatures
    pub secrets: WebhookSecrets,
}

impl BotSettings {
    pub fn new(projects: ProjectResolver, naming: NamingPattern, secrets: WebhookSecrets) -> Self {
        Self {
            projects,
            naming,
            secrets,
        }
    }
}
